//! OAuth client-credentials exchange for v4 API access.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::domain::gateway::{Credential, TransportFailure};
use crate::ports::{
    HttpMethod, HttpRequest, HttpTransport, RequestBody, TokenFetchError, TokenSource,
};

/// Identity provider token endpoint.
pub const DEFAULT_TOKEN_URL: &str =
    "https://idp.flutterwave.com/realms/flutterwave/protocol/openid-connect/token";

/// Fetches access tokens from the identity provider.
pub struct OAuthTokenSource {
    transport: Arc<dyn HttpTransport>,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    timeout: Duration,
}

impl OAuthTokenSource {
    /// Uses the credential's public key as client id and secret key as client secret.
    pub fn new(credential: &Credential, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: credential.public_key().trim().to_string(),
            client_secret: SecretString::new(credential.secret_key().trim().to_string()),
            timeout: credential.timeout(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    fn request(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, &self.token_url, self.timeout)
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(RequestBody::Form(vec![
                ("client_id".to_string(), self.client_id.clone()),
                (
                    "client_secret".to_string(),
                    self.client_secret.expose_secret().clone(),
                ),
                ("grant_type".to_string(), "client_credentials".to_string()),
            ]))
    }
}

/// Best human-readable reason from an OAuth error body.
fn error_description(body: &Value) -> Option<String> {
    ["error_description", "error", "message"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl TokenSource for OAuthTokenSource {
    async fn fetch(&self) -> Result<Value, TokenFetchError> {
        let response = self
            .transport
            .send(self.request())
            .await
            .map_err(TokenFetchError::Transient)?;

        if response.status >= 500 || response.status == 429 {
            return Err(TokenFetchError::Transient(TransportFailure::other(format!(
                "token endpoint returned HTTP {}",
                response.status
            ))));
        }

        let body = response.json();

        if !response.is_success() {
            let reason = body
                .as_ref()
                .and_then(error_description)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            return Err(TokenFetchError::Rejected(reason));
        }

        body.ok_or_else(|| TokenFetchError::Rejected("token response is not valid JSON".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HttpResponse;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedTransport {
        reply: Result<HttpResponse, TransportFailure>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(reply: Result<HttpResponse, TransportFailure>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    fn credential() -> Credential {
        Credential::new(" client-id ", " client-secret ").unwrap()
    }

    #[tokio::test]
    async fn posts_client_credentials_form() {
        let transport = ScriptedTransport::new(Ok(HttpResponse::new(
            200,
            r#"{"access_token":"tok1","expires_in":600}"#,
        )));
        let source = OAuthTokenSource::new(&credential(), transport.clone());

        let grant = source.fetch().await.unwrap();

        assert_eq!(grant["access_token"], json!("tok1"));
        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, DEFAULT_TOKEN_URL);
        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("client_id".into(), "client-id".into()),
                ("client_secret".into(), "client-secret".into()),
                ("grant_type".into(), "client_credentials".into()),
            ])
        );
    }

    #[tokio::test]
    async fn network_failure_is_transient() {
        let transport = ScriptedTransport::new(Err(TransportFailure::connect("refused")));
        let source = OAuthTokenSource::new(&credential(), transport);

        let err = source.fetch().await.unwrap_err();

        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let transport = ScriptedTransport::new(Ok(HttpResponse::new(503, "unavailable")));
        let source = OAuthTokenSource::new(&credential(), transport);

        assert!(source.fetch().await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn client_error_is_permanent_with_description() {
        let transport = ScriptedTransport::new(Ok(HttpResponse::new(
            401,
            r#"{"error":"invalid_client","error_description":"Invalid client credentials"}"#,
        )));
        let source = OAuthTokenSource::new(&credential(), transport);

        match source.fetch().await.unwrap_err() {
            TokenFetchError::Rejected(reason) => assert_eq!(reason, "Invalid client credentials"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_permanent() {
        let transport = ScriptedTransport::new(Ok(HttpResponse::new(200, "<html/>")));
        let source = OAuthTokenSource::new(&credential(), transport);

        assert!(!source.fetch().await.unwrap_err().is_retryable());
    }
}
