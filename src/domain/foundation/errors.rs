//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Reason an API path was refused by the endpoint sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointViolation {
    /// Contains `..`.
    ParentTraversal,
    /// Contains `//`.
    DoubleSlash,
    /// Contains a backslash.
    Backslash,
    /// Contains a percent-encoded traversal sequence.
    EncodedTraversal,
    /// Starts with `http://` or `https://`.
    AbsoluteUrl,
    /// Starts with another URL scheme (`file:`, `ftp:`, ...).
    ForbiddenScheme,
    /// Longer than the maximum endpoint length.
    TooLong,
    /// An identifier meant for one path segment contains `/`.
    NestedSegment,
}

impl fmt::Display for EndpointViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndpointViolation::ParentTraversal
            | EndpointViolation::DoubleSlash
            | EndpointViolation::Backslash
            | EndpointViolation::EncodedTraversal => "path traversal sequence",
            EndpointViolation::AbsoluteUrl => "absolute URLs not allowed",
            EndpointViolation::ForbiddenScheme => "URL scheme not allowed",
            EndpointViolation::TooLong => "endpoint exceeds maximum length",
            EndpointViolation::NestedSegment => "identifier must be a single path segment",
        };
        write!(f, "{}", s)
    }
}

/// Errors that occur while validating caller-supplied input.
///
/// Messages never echo the offending value, so they are safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(EndpointViolation),

    #[error("Invalid transaction ID format")]
    InvalidTransactionId,

    #[error("Transaction ID exceeds maximum length")]
    TransactionIdTooLong,

    #[error("Invalid card BIN format. BIN must be exactly 6 digits.")]
    InvalidCardBin,

    #[error("Invalid account number format.")]
    InvalidAccountNumber,

    #[error("Invalid bank code format.")]
    InvalidBankCode,

    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }
}

/// Error codes for storage-facing ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
