//! Flutterwave adapters - the outbound API client and everything it needs.
//!
//! - `ApiClient` - authenticated GET/POST/PUT/DELETE with typed errors
//! - `TokenCache` / `OAuthTokenSource` - v4 bearer tokens
//! - `Payments`, `Transfers`, `Subscriptions`, `VirtualAccounts`, `Verification`
//! - `MockTransport` - scripted transport for tests

mod client;
mod mock_transport;
mod oauth;
mod resources;
mod token_cache;

pub use client::{authorization_preview, ApiClient, ApiRequest};
pub use mock_transport::MockTransport;
pub use oauth::{OAuthTokenSource, DEFAULT_TOKEN_URL};
pub use resources::{Payments, Subscriptions, Transfers, Verification, VirtualAccounts};
pub use token_cache::{TokenCache, DEFAULT_MAX_RETRIES};
