//! Result of running a request through the admission pipeline.

use std::fmt;

use super::request::WebhookRequest;

/// Why a webhook request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    PayloadTooLarge { size: u64, max: u64 },
    IpNotAllowed,
    RateLimited { retry_after_secs: u32 },
    StaleTimestamp { skew_secs: i64 },
    MalformedTimestamp,
    SecretNotConfigured,
    MissingSignature,
    InvalidSignature,
}

impl RejectReason {
    /// HTTP status returned to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            RejectReason::PayloadTooLarge { .. } => 413,
            RejectReason::RateLimited { .. } => 429,
            RejectReason::SecretNotConfigured => 500,
            RejectReason::IpNotAllowed
            | RejectReason::StaleTimestamp { .. }
            | RejectReason::MalformedTimestamp
            | RejectReason::MissingSignature
            | RejectReason::InvalidSignature => 401,
        }
    }

    /// Client-facing error text. Never contains secret material.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::PayloadTooLarge { .. } => "Request too large",
            RejectReason::IpNotAllowed | RejectReason::MissingSignature => "Unauthorized",
            RejectReason::RateLimited { .. } => "Too many requests",
            RejectReason::StaleTimestamp { .. } | RejectReason::MalformedTimestamp => {
                "Request timestamp invalid"
            }
            RejectReason::SecretNotConfigured => "Webhook secret not configured",
            RejectReason::InvalidSignature => "Invalid signature",
        }
    }

    /// Pipeline stage that produced the rejection, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            RejectReason::PayloadTooLarge { .. } => "size",
            RejectReason::IpNotAllowed => "ip_allowlist",
            RejectReason::RateLimited { .. } => "rate_limit",
            RejectReason::StaleTimestamp { .. } | RejectReason::MalformedTimestamp => "timestamp",
            RejectReason::SecretNotConfigured
            | RejectReason::MissingSignature
            | RejectReason::InvalidSignature => "signature",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

/// A request that passed every admission stage.
///
/// Only the admission pipeline can construct one, so holding an
/// `AdmittedWebhook` is proof the checks ran.
#[derive(Debug, Clone)]
pub struct AdmittedWebhook {
    request: WebhookRequest,
}

impl AdmittedWebhook {
    pub(crate) fn new(request: WebhookRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &WebhookRequest {
        &self.request
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    pub fn into_request(self) -> WebhookRequest {
        self.request
    }
}

/// Terminal verdict for one inbound request.
#[derive(Debug, Clone)]
pub enum AdmissionDecision {
    Accept(AdmittedWebhook),
    Reject(RejectReason),
}

impl AdmissionDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AdmissionDecision::Accept(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            AdmissionDecision::Reject(reason) => Some(*reason),
            AdmissionDecision::Accept(_) => None,
        }
    }
}
