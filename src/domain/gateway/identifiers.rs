//! Validated identifiers interpolated into resource paths.

use std::fmt;

use crate::domain::foundation::ValidationError;

/// Longest transaction identifier accepted.
pub const MAX_TRANSACTION_ID_LENGTH: usize = 100;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// A gateway transaction or resource id: `[A-Za-z0-9_-]{1,100}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.is_empty() || !raw.chars().all(is_id_char) {
            return Err(ValidationError::InvalidTransactionId);
        }
        if raw.len() > MAX_TRANSACTION_ID_LENGTH {
            return Err(ValidationError::TransactionIdTooLong);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First six digits of a card number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardBin(String);

impl CardBin {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.len() != 6 || !all_digits(raw) {
            return Err(ValidationError::InvalidCardBin);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bank account number. Digits only; deliberately has no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if !all_digits(raw) {
            return Err(ValidationError::InvalidAccountNumber);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountNumber([REDACTED])")
    }
}

/// Numeric bank code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankCode(String);

impl BankCode {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if !all_digits(raw) {
            return Err(ValidationError::InvalidBankCode);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transaction_id_accepts_alphanumerics_dash_underscore() {
        assert_eq!(TransactionId::parse("FLW-MOCK_123abc").unwrap().as_str(), "FLW-MOCK_123abc");
        assert_eq!(TransactionId::from(288200108u64).as_str(), "288200108");
    }

    #[test]
    fn transaction_id_rejects_path_characters() {
        for raw in ["", "12/34", "../1", "1 2", "abc?x=1", "ünicode"] {
            assert_eq!(
                TransactionId::parse(raw),
                Err(ValidationError::InvalidTransactionId),
                "{:?}",
                raw
            );
        }
    }

    #[test]
    fn transaction_id_length_limit() {
        assert!(TransactionId::parse("a".repeat(100)).is_ok());
        assert_eq!(
            TransactionId::parse("a".repeat(101)),
            Err(ValidationError::TransactionIdTooLong)
        );
    }

    #[test]
    fn card_bin_is_exactly_six_digits() {
        assert!(CardBin::parse("539983").is_ok());
        assert_eq!(CardBin::parse("53998"), Err(ValidationError::InvalidCardBin));
        assert_eq!(CardBin::parse("5399834"), Err(ValidationError::InvalidCardBin));
        assert_eq!(CardBin::parse("53998a"), Err(ValidationError::InvalidCardBin));
    }

    #[test]
    fn account_number_and_bank_code_are_digits() {
        assert!(AccountNumber::parse("0690000031").is_ok());
        assert!(AccountNumber::parse("069-000").is_err());
        assert!(AccountNumber::parse("").is_err());
        assert!(BankCode::parse("044").is_ok());
        assert!(BankCode::parse("04a").is_err());
    }

    #[test]
    fn account_number_debug_is_redacted() {
        let acct = AccountNumber::parse("0690000031").unwrap();
        assert!(!format!("{:?}", acct).contains("0690000031"));
    }

    proptest! {
        #[test]
        fn valid_ids_round_trip(raw in "[A-Za-z0-9_-]{1,100}") {
            let id = TransactionId::parse(&raw).unwrap();
            prop_assert_eq!(id.as_str(), raw.as_str());
        }
    }
}
