//! Foundation module - Shared domain primitives.
//!
//! Contains the time value object, error vocabulary, and log redaction
//! used across the gateway and webhook domains.

mod errors;
mod redaction;
mod timestamp;

pub use errors::{DomainError, EndpointViolation, ErrorCode, ValidationError};
pub use redaction::{is_sensitive_key, redact, redact_map, REDACTION_MARKER};
pub use timestamp::Timestamp;
