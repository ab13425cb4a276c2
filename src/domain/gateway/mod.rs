//! Gateway domain - credentials, tokens, paths and errors for outbound calls.

mod credential;
mod endpoint;
mod errors;
mod identifiers;
mod token;

pub use credential::{
    ApiVersion, Credential, GatewayEnvironment, ALLOWED_HOST_SUFFIXES, DEFAULT_COUNTRY,
    DEFAULT_CURRENCY, DEFAULT_TIMEOUT_SECS,
};
pub use endpoint::{path_segment, sanitize_endpoint, Endpoint, MAX_ENDPOINT_LENGTH};
pub use errors::{GatewayError, TransportErrorKind, TransportFailure};
pub use identifiers::{AccountNumber, BankCode, CardBin, TransactionId, MAX_TRANSACTION_ID_LENGTH};
pub use token::{AccessToken, TOKEN_SAFETY_MARGIN_SECS};
