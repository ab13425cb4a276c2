//! Inbound webhook handling: admission, then dispatch.

mod dispatcher;
mod gate;

pub use dispatcher::{Dispatched, WebhookDispatcher};
pub use gate::{
    WebhookGate, WebhookGateConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_RATE_LIMIT_PER_MINUTE,
};
