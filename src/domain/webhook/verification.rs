//! Signature and freshness checks for gateway callbacks.
//!
//! The gateway sends the operator-configured secret hash verbatim in the
//! `verif-hash` header, so verification is an equality check. Both sides
//! are hashed with SHA-256 first and the fixed-length digests compared in
//! constant time, so neither content nor length leaks through timing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::domain::foundation::Timestamp;

/// Header carrying the shared secret hash.
pub const SIGNATURE_HEADER: &str = "verif-hash";

/// Optional header carrying the send time as Unix seconds.
pub const TIMESTAMP_HEADER: &str = "x-flutterwave-timestamp";

/// Maximum tolerated distance between the header timestamp and now.
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Outcome of comparing the signature header with the configured hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    Missing,
    Mismatch,
}

/// Outcome of the replay-window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessCheck {
    Fresh,
    /// No timestamp header; tolerated.
    Absent,
    /// Outside the window; carries `now - sent` in seconds.
    Stale { skew_secs: i64 },
    /// Present but not an integer.
    Malformed,
}

/// Compares the provided signature with the configured secret hash.
pub fn verify_signature(secret_hash: &str, provided: Option<&str>) -> SignatureCheck {
    match provided {
        None | Some("") => SignatureCheck::Missing,
        Some(signature) if constant_time_compare(secret_hash.as_bytes(), signature.as_bytes()) => {
            SignatureCheck::Valid
        }
        Some(_) => SignatureCheck::Mismatch,
    }
}

/// Checks a timestamp header value against `now`.
pub fn check_freshness(header: Option<&str>, now: &Timestamp) -> FreshnessCheck {
    let Some(raw) = header else {
        return FreshnessCheck::Absent;
    };
    let Ok(sent) = raw.trim().parse::<i64>() else {
        return FreshnessCheck::Malformed;
    };

    let skew_secs = now.as_unix_secs().saturating_sub(sent);
    if skew_secs.saturating_abs() > MAX_TIMESTAMP_SKEW_SECS {
        FreshnessCheck::Stale { skew_secs }
    } else {
        FreshnessCheck::Fresh
    }
}

/// Equality over SHA-256 digests of both inputs, compared with `ct_eq`.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    let a = Sha256::digest(a);
    let b = Sha256::digest(b);
    a.as_slice().ct_eq(b.as_slice()).into()
}
