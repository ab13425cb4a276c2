//! `HttpTransport` backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::domain::gateway::{GatewayError, TransportFailure};
use crate::ports::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody};

/// Connect timeout applied to every request, shorter than the total timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-based transport. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client with the default connect timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("flutterwave-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::timeout(error.to_string())
    } else if error.is_connect() {
        TransportFailure::connect(error.to_string())
    } else {
        TransportFailure::other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}
