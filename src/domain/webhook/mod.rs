//! Webhook domain - inbound request description, admission verdicts and
//! the checks that produce them.

mod admission;
mod envelope;
mod ip_allowlist;
mod request;
mod verification;

pub use admission::{AdmissionDecision, AdmittedWebhook, RejectReason};
pub use envelope::{
    WebhookEnvelope, WebhookEventKind, EVENT_CHARGE_COMPLETED, EVENT_CHARGE_FAILED,
    EVENT_CHARGE_SUCCESSFUL,
};
pub use ip_allowlist::{IpAllowList, IpAllowListError, IpRule};
pub use request::WebhookRequest;
pub use verification::{
    check_freshness, verify_signature, FreshnessCheck, SignatureCheck, MAX_TIMESTAMP_SKEW_SECS,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
