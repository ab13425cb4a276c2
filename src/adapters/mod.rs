//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `flutterwave` - Gateway API client, OAuth tokens, resource services
//! - `http` - reqwest transport and the axum webhook route
//! - `rate_limiter` - In-memory and Redis rate-limit stores
//! - `webhook_store` - Processed webhook event records

pub mod flutterwave;
pub mod http;
pub mod rate_limiter;
pub mod webhook_store;
