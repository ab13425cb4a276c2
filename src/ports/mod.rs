//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Outbound Ports
//!
//! - `HttpTransport` - Sends one HTTP request to the gateway
//! - `TokenSource` - One OAuth client-credentials exchange
//! - `Clock` - Injectable wall-clock time
//!
//! ## Webhook Ports
//!
//! - `RateLimiter` - Fixed-window request counting per source IP
//! - `WebhookEventRepository` - Redelivery tracking for webhook events

mod clock;
mod http_transport;
mod rate_limiter;
mod token_source;
mod webhook_event_repository;

pub use clock::{Clock, MockClock, SystemClock};
pub use http_transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter,
};
pub use token_source::{TokenFetchError, TokenSource};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};
