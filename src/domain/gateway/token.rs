//! OAuth access token held by the token cache.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::errors::GatewayError;
use crate::domain::foundation::Timestamp;

/// Seconds subtracted from `expires_in` so a token is refreshed before the
/// identity provider considers it expired.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// A bearer token together with its effective expiry.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: Timestamp,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            value: SecretString::new(value.into()),
            expires_at,
        }
    }

    /// Builds a token from an OAuth client-credentials response.
    ///
    /// The response must carry a non-empty string `access_token` and a
    /// numeric `expires_in`; the effective expiry is
    /// `issued_at + expires_in - TOKEN_SAFETY_MARGIN_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::AuthFailed` for any structurally invalid grant,
    /// including an `expires_in` whose expiry cannot be represented.
    pub fn from_grant(grant: &Value, issued_at: Timestamp) -> Result<Self, GatewayError> {
        let value = grant
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| GatewayError::auth_failed("Invalid token response: missing access_token"))?;

        let expires_in = grant
            .get("expires_in")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .ok_or_else(|| GatewayError::auth_failed("Invalid token response: missing expires_in"))?;

        let expires_at = expires_in
            .checked_sub(TOKEN_SAFETY_MARGIN_SECS)
            .and_then(|lifetime| issued_at.checked_plus_secs(lifetime))
            .ok_or_else(|| {
                GatewayError::auth_failed("Invalid token response: expires_in out of range")
            })?;

        Ok(Self::new(value, expires_at))
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// True while `now` is strictly before the effective expiry.
    pub fn is_valid_at(&self, now: &Timestamp) -> bool {
        now.is_before(&self.expires_at)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issued() -> Timestamp {
        Timestamp::from_unix_secs(1_700_000_000)
    }

    #[test]
    fn expiry_subtracts_safety_margin() {
        let token =
            AccessToken::from_grant(&json!({"access_token": "tok1", "expires_in": 600}), issued())
                .unwrap();
        assert_eq!(token.expose(), "tok1");
        assert_eq!(token.expires_at().as_unix_secs(), 1_700_000_540);
    }

    #[test]
    fn valid_strictly_before_expiry() {
        let token = AccessToken::new("t", issued().plus_secs(540));
        assert!(token.is_valid_at(&issued()));
        assert!(token.is_valid_at(&issued().plus_secs(539)));
        assert!(!token.is_valid_at(&issued().plus_secs(540)));
    }

    #[test]
    fn missing_or_empty_access_token_is_auth_failure() {
        for grant in [
            json!({"expires_in": 600}),
            json!({"access_token": "", "expires_in": 600}),
            json!({"access_token": 42, "expires_in": 600}),
        ] {
            assert!(matches!(
                AccessToken::from_grant(&grant, issued()),
                Err(GatewayError::AuthFailed { .. })
            ));
        }
    }

    #[test]
    fn non_numeric_expires_in_is_auth_failure() {
        let grant = json!({"access_token": "tok", "expires_in": "soon"});
        assert!(AccessToken::from_grant(&grant, issued()).is_err());
    }

    #[test]
    fn out_of_range_expires_in_is_auth_failure() {
        for grant in [
            json!({"access_token": "tok", "expires_in": 1e18}),
            json!({"access_token": "tok", "expires_in": i64::MIN}),
            json!({"access_token": "tok", "expires_in": i64::MAX}),
        ] {
            match AccessToken::from_grant(&grant, issued()) {
                Err(GatewayError::AuthFailed { message, .. }) => {
                    assert!(message.contains("out of range"), "{}", message)
                }
                other => panic!("expected AuthFailed for {}, got {:?}", grant, other),
            }
        }
    }

    #[test]
    fn debug_hides_value() {
        let token = AccessToken::new("super-secret-token", issued());
        assert!(!format!("{:?}", token).contains("super-secret-token"));
    }
}
