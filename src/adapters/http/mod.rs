//! HTTP adapters - outbound transport and inbound webhook route.

mod reqwest_transport;
pub mod webhook;

pub use reqwest_transport::{ReqwestTransport, CONNECT_TIMEOUT};
pub use webhook::{webhook_router, WebhookAppState};
