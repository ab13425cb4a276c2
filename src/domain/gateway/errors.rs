//! Error taxonomy for outbound gateway calls.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Classification of a network-level failure with no usable HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or connect timeout elapsed.
    Timeout,
    /// DNS resolution or TCP/TLS connection failed.
    Connect,
    /// Any other failure before a response arrived.
    Other,
}

/// A failure raised by an HTTP transport before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connect,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            message: message.into(),
        }
    }
}

/// Errors returned by the gateway client.
///
/// Construction problems (`Config`) and bad input (`Validation`) fail fast.
/// `AuthFailed` is only produced after the token exchange has exhausted its
/// retries. `Api` and `Transport` are handed back to the caller untouched.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to authenticate with Flutterwave: {message}")]
    AuthFailed {
        message: String,
        #[source]
        source: Option<TransportFailure>,
    },

    #[error("{message}")]
    Api { message: String, status: u16 },

    #[error("{message}")]
    Transport {
        message: String,
        kind: TransportErrorKind,
    },

    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::Config(message.into())
    }

    /// Creates an application-level API error.
    pub fn api(message: impl Into<String>, status: u16) -> Self {
        GatewayError::Api {
            message: message.into(),
            status,
        }
    }

    /// Creates an authentication failure without an underlying transport error.
    pub fn auth_failed(message: impl Into<String>) -> Self {
        GatewayError::AuthFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a network failure with a human-readable cause.
    ///
    /// Timeouts and connection problems get a hint to check connectivity;
    /// anything else is reported as a generic request failure.
    pub fn from_transport(failure: TransportFailure) -> Self {
        let message = match failure.kind {
            TransportErrorKind::Timeout | TransportErrorKind::Connect => format!(
                "Flutterwave API connection failed: {}. Please check your network connection and API endpoint.",
                failure.message
            ),
            TransportErrorKind::Other => {
                format!("Flutterwave API request failed: {}", failure.message)
            }
        };
        GatewayError::Transport {
            message,
            kind: failure.kind,
        }
    }

    /// HTTP status returned by the gateway, or 0 when none was received.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Api { status, .. } => *status,
            _ => 0,
        }
    }

    /// Whether a caller may reasonably retry the same call.
    ///
    /// The client itself never retries outside the token exchange.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { .. } => true,
            GatewayError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
