//! WebhookGate - staged admission of inbound gateway callbacks.
//!
//! Stages run in a fixed order and the first rejection wins:
//! 1. Size (`Content-Length` against the configured maximum)
//! 2. IP allow-list (empty list admits everyone)
//! 3. Per-IP rate limit (fixed 60 second window, 0 disables)
//! 4. Timestamp freshness (optional; a missing header is tolerated)
//! 5. Signature (constant-time comparison with the configured hash)
//!
//! The gate never returns an error. Every outcome is an `AdmissionDecision`.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::webhook::{
    check_freshness, verify_signature, AdmissionDecision, AdmittedWebhook, FreshnessCheck,
    IpAllowList, RejectReason, SignatureCheck, WebhookRequest, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
use crate::ports::{
    Clock, RateLimitKey, RateLimitPolicy, RateLimitResult, RateLimiter, SystemClock,
};

/// Default maximum accepted body size, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 1_048_576;

/// Default per-IP requests per minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Gate settings.
#[derive(Clone)]
pub struct WebhookGateConfig {
    pub max_body_size: u64,
    pub allowed_ips: IpAllowList,
    /// Requests per minute per source IP; 0 disables rate limiting.
    pub rate_limit_per_minute: u32,
    pub validate_timestamp: bool,
    pub secret_hash: Option<SecretString>,
}

impl Default for WebhookGateConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allowed_ips: IpAllowList::allow_all(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            validate_timestamp: true,
            secret_hash: None,
        }
    }
}

impl std::fmt::Debug for WebhookGateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookGateConfig")
            .field("max_body_size", &self.max_body_size)
            .field("allowed_ips", &self.allowed_ips)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("validate_timestamp", &self.validate_timestamp)
            .field("secret_hash", &self.secret_hash.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Admission pipeline for webhook requests.
pub struct WebhookGate {
    config: WebhookGateConfig,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    clock: Arc<dyn Clock>,
}

impl WebhookGate {
    pub fn new(config: WebhookGateConfig) -> Self {
        Self {
            config,
            rate_limiter: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Attaches the store used by the rate-limit stage.
    ///
    /// Without one the stage is skipped.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &WebhookGateConfig {
        &self.config
    }

    /// Runs every stage against `request`.
    pub async fn admit(&self, request: WebhookRequest) -> AdmissionDecision {
        match self.run_stages(&request).await {
            Ok(()) => AdmissionDecision::Accept(AdmittedWebhook::new(request)),
            Err(reason) => {
                tracing::warn!(
                    ip = %request.source_ip(),
                    stage = reason.stage(),
                    status = reason.status_code(),
                    reason = ?reason,
                    "Webhook request rejected"
                );
                AdmissionDecision::Reject(reason)
            }
        }
    }

    async fn run_stages(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        self.check_size(request)?;
        self.check_ip(request)?;
        self.check_rate_limit(request).await?;
        self.check_timestamp(request)?;
        self.check_signature(request)
    }

    fn check_size(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        match request.content_length() {
            Some(size) if size > self.config.max_body_size => Err(RejectReason::PayloadTooLarge {
                size,
                max: self.config.max_body_size,
            }),
            _ => Ok(()),
        }
    }

    fn check_ip(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        if self.config.allowed_ips.is_allowed(request.source_ip()) {
            Ok(())
        } else {
            Err(RejectReason::IpNotAllowed)
        }
    }

    async fn check_rate_limit(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        let limit = self.config.rate_limit_per_minute;
        let Some(limiter) = self.rate_limiter.as_ref().filter(|_| limit > 0) else {
            return Ok(());
        };

        let key = RateLimitKey::webhook_ip(request.source_ip());
        match limiter.check(&key, RateLimitPolicy::per_minute(limit)).await {
            Ok(RateLimitResult::Allowed(_)) => Ok(()),
            Ok(RateLimitResult::Denied(denied)) => Err(RejectReason::RateLimited {
                retry_after_secs: denied.retry_after_secs,
            }),
            Err(e) => {
                // Fail open for availability
                tracing::warn!(ip = %request.source_ip(), error = %e, "Rate limiter unavailable");
                Ok(())
            }
        }
    }

    fn check_timestamp(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        if !self.config.validate_timestamp {
            return Ok(());
        }

        match check_freshness(request.header(TIMESTAMP_HEADER), &self.clock.now()) {
            FreshnessCheck::Fresh => Ok(()),
            FreshnessCheck::Absent => {
                tracing::debug!(ip = %request.source_ip(), "Webhook timestamp header missing");
                Ok(())
            }
            FreshnessCheck::Stale { skew_secs } => Err(RejectReason::StaleTimestamp { skew_secs }),
            FreshnessCheck::Malformed => Err(RejectReason::MalformedTimestamp),
        }
    }

    fn check_signature(&self, request: &WebhookRequest) -> Result<(), RejectReason> {
        let Some(secret_hash) = &self.config.secret_hash else {
            tracing::error!("Webhook secret hash is not configured");
            return Err(RejectReason::SecretNotConfigured);
        };

        match verify_signature(secret_hash.expose_secret(), request.header(SIGNATURE_HEADER)) {
            SignatureCheck::Valid => Ok(()),
            SignatureCheck::Missing => Err(RejectReason::MissingSignature),
            SignatureCheck::Mismatch => Err(RejectReason::InvalidSignature),
        }
    }
}
