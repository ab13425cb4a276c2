//! Application handlers.
//!
//! Orchestrate domain checks over the ports.

pub mod webhook;

pub use webhook::{Dispatched, WebhookDispatcher, WebhookGate, WebhookGateConfig};
