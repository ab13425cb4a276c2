//! HTTP adapter for inbound webhooks.
//!
//! - `POST /flutterwave/webhook` - Gate, dispatch, acknowledge

mod handlers;
mod routes;

pub use handlers::{handle_flutterwave_webhook, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
