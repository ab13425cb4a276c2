//! Framework-neutral description of an inbound webhook request.

use std::collections::HashMap;
use std::net::IpAddr;

/// Everything the admission pipeline needs to know about one request.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    source_ip: IpAddr,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(source_ip: IpAddr, body: impl Into<Vec<u8>>) -> Self {
        Self {
            source_ip,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header; a later value for the same name replaces the earlier one.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }
}
