//! Domain layer containing the gateway and webhook business rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, validation errors, redaction)
//! - `gateway` - Credentials, access tokens, endpoints and the outbound error taxonomy
//! - `webhook` - Inbound request description, admission checks and event envelopes

pub mod foundation;
pub mod gateway;
pub mod webhook;
