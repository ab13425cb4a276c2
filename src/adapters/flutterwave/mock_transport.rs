//! Mock HTTP transport for testing.
//!
//! Replays scripted replies in order (the last one repeats) and records
//! every request so tests can assert on URLs, headers and bodies without
//! touching the network.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::replying(200, r#"{"status":"success"}"#);
//! let client = ApiClient::new(credential, transport.clone());
//! client.get("banks/NG", json!({})).await?;
//! assert_eq!(transport.requests()[0].url, "https://api.flutterwave.com/v3/banks/NG");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::gateway::TransportFailure;
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};

type Reply = Result<HttpResponse, TransportFailure>;

#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Replays `replies` in order; the final reply repeats forever.
    pub fn with_sequence(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Always answers with `status` and `body`.
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self::with_sequence(vec![Ok(HttpResponse::new(status, body))]))
    }

    /// Always fails with `failure`.
    pub fn failing(failure: TransportFailure) -> Arc<Self> {
        Arc::new(Self::with_sequence(vec![Err(failure)]))
    }

    /// Waits this long before answering (honours paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        if replies.len() > 1 {
            if let Some(reply) = replies.pop_front() {
                return reply;
            }
        }
        replies
            .front()
            .cloned()
            .unwrap_or_else(|| Err(TransportFailure::other("no scripted reply")))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HttpMethod;

    fn request(url: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, url, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn replays_in_order_and_repeats_last() {
        let transport = MockTransport::with_sequence(vec![
            Ok(HttpResponse::new(500, "")),
            Ok(HttpResponse::new(200, "ok")),
        ]);

        assert_eq!(transport.send(request("a")).await.unwrap().status, 500);
        assert_eq!(transport.send(request("b")).await.unwrap().status, 200);
        assert_eq!(transport.send(request("c")).await.unwrap().status, 200);

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_script_fails() {
        let transport = MockTransport::default();
        assert!(transport.send(request("a")).await.is_err());
        assert_eq!(transport.request_count(), 1);
    }
}
