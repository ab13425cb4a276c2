//! Authenticated client for the Flutterwave REST API.
//!
//! Every call sanitizes its endpoint before anything else happens, picks
//! the bearer credential from the configured API version, and maps the
//! response onto `GatewayError`. Nothing here retries except the v4 token
//! exchange inside `TokenCache`.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::redact;
use crate::domain::gateway::{Credential, Endpoint, GatewayError};
use crate::ports::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, TokenSource,
};

use super::oauth::OAuthTokenSource;
use super::token_cache::TokenCache;

/// Fallback when an error response carries no usable message.
const GENERIC_API_ERROR: &str = "Flutterwave API request failed";

/// One logical API call before authentication is applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    /// Adds query parameters. String values are sent as-is, other JSON
    /// scalars in their JSON form; nulls are skipped.
    pub fn with_query(mut self, query: &Value) -> Self {
        if let Some(map) = query.as_object() {
            self.query.extend(map.iter().filter_map(|(k, v)| {
                let v = match v {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((k.clone(), v))
            }));
        }
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Shared Flutterwave API client. Construct once and share behind an `Arc`.
pub struct ApiClient {
    credential: Credential,
    transport: Arc<dyn HttpTransport>,
    token_cache: Option<Arc<TokenCache>>,
    log_requests: bool,
}

impl ApiClient {
    /// Creates a client; v4 credentials get an OAuth token cache over the
    /// same transport.
    pub fn new(credential: Credential, transport: Arc<dyn HttpTransport>) -> Self {
        let token_cache = credential.api_version().uses_oauth().then(|| {
            let source: Arc<dyn TokenSource> =
                Arc::new(OAuthTokenSource::new(&credential, transport.clone()));
            Arc::new(TokenCache::new(source))
        });

        Self {
            credential,
            transport,
            token_cache,
            log_requests: false,
        }
    }

    /// Replaces the token cache (v4 only; ignored for v3).
    pub fn with_token_cache(mut self, token_cache: Arc<TokenCache>) -> Self {
        if self.credential.api_version().uses_oauth() {
            self.token_cache = Some(token_cache);
        }
        self
    }

    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn token_cache(&self) -> Option<&Arc<TokenCache>> {
        self.token_cache.as_ref()
    }

    pub async fn get(&self, endpoint: &str, query: Value) -> Result<Value, GatewayError> {
        self.request(ApiRequest::get(endpoint).with_query(&query)).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(ApiRequest::post(endpoint).with_body(body)).await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(ApiRequest::put(endpoint).with_body(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.request(ApiRequest::delete(endpoint)).await
    }

    pub async fn request(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        self.request_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Performs one API call, aborting when `cancel` fires.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unsafe endpoint, before any network activity
    /// - `AuthFailed` when a v4 token cannot be obtained
    /// - `Api` for non-2xx responses and `"status": "error"` bodies
    /// - `Transport` when no response was received
    /// - `Cancelled` when `cancel` fires first
    pub async fn request_with_cancel(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, GatewayError> {
        let endpoint = Endpoint::parse(&request.endpoint)?;
        let authorization = format!("Bearer {}", self.bearer(cancel).await?);
        let url = endpoint.join_onto(&self.credential.base_url());

        let http_request = HttpRequest::new(request.method, url, self.credential.timeout())
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .query(request.query)
            .body(match request.body {
                Some(body) => RequestBody::Json(body),
                None => RequestBody::None,
            });

        if self.log_requests {
            self.log_request(&endpoint, &http_request);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            outcome = self.transport.send(http_request) => outcome,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(failure) => {
                let error = GatewayError::from_transport(failure);
                if self.log_requests {
                    tracing::error!(
                        method = %request.method,
                        endpoint = %endpoint,
                        error = %error,
                        "Flutterwave API connection error"
                    );
                }
                return Err(error);
            }
        };

        if !self.log_requests {
            return interpret(response);
        }

        let status = response.status;
        let body = response.json().map(|b| redact(&b)).unwrap_or(Value::Null);
        let result = interpret(response);
        match &result {
            Ok(_) => tracing::info!(
                method = %request.method,
                endpoint = %endpoint,
                status,
                body = %body,
                "Flutterwave API response"
            ),
            Err(error) => tracing::error!(
                method = %request.method,
                endpoint = %endpoint,
                status,
                body = %body,
                error = %error,
                "Flutterwave API error"
            ),
        }
        result
    }

    async fn bearer(&self, cancel: &CancellationToken) -> Result<String, GatewayError> {
        match &self.token_cache {
            Some(cache) => cache.get_token(cancel).await,
            None => Ok(self.credential.secret_key().to_string()),
        }
    }

    fn log_request(&self, endpoint: &Endpoint, request: &HttpRequest) {
        let mut options = Map::new();
        if !request.query.is_empty() {
            let query: Map<String, Value> = request
                .query
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            options.insert("query".into(), Value::Object(query));
        }
        if let RequestBody::Json(body) = &request.body {
            options.insert("json".into(), body.clone());
        }

        tracing::info!(
            method = %request.method,
            endpoint = %endpoint,
            url = %request.url,
            authorization = %request
                .header_value("Authorization")
                .map(authorization_preview)
                .unwrap_or_default(),
            options = %redact(&serde_json::Value::Object(options)),
            "Flutterwave API request"
        );
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("credential", &self.credential)
            .field("log_requests", &self.log_requests)
            .finish_non_exhaustive()
    }
}

/// Maps a raw response onto the client's result.
fn interpret(response: HttpResponse) -> Result<Value, GatewayError> {
    let body = if response.body.trim().is_empty() {
        Some(Value::Object(Map::new()))
    } else {
        response.json()
    };

    if !response.is_success() {
        let message = body
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| GENERIC_API_ERROR.to_string());
        return Err(GatewayError::api(message, response.status));
    }

    let body = body.ok_or_else(|| {
        GatewayError::api("Invalid JSON response from Flutterwave", response.status)
    })?;

    if body.get("status").and_then(Value::as_str) == Some("error") {
        let message = error_message(&body).unwrap_or_else(|| GENERIC_API_ERROR.to_string());
        return Err(GatewayError::api(message, response.status));
    }

    Ok(body)
}

/// `message`, else `data.message`.
fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/data/message").and_then(Value::as_str))
        .map(str::to_string)
}

/// Loggable form of an Authorization header: first 20 and last 10 characters.
///
/// Headers too short to hide anything that way are masked completely.
pub fn authorization_preview(header: &str) -> String {
    let chars: Vec<char> = header.chars().collect();
    if chars.len() <= 30 {
        return "***".to_string();
    }
    let head: String = chars[..20].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}
