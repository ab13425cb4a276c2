//! HTTP handler for inbound Flutterwave webhooks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::handlers::webhook::{WebhookDispatcher, WebhookGate};
use crate::domain::webhook::{AdmissionDecision, RejectReason, WebhookRequest};

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookAppState {
    pub gate: Arc<WebhookGate>,
    pub dispatcher: Arc<WebhookDispatcher>,
    /// Take the client IP from proxy headers before the socket address.
    pub trust_proxy_headers: bool,
}

impl WebhookAppState {
    pub fn new(gate: Arc<WebhookGate>, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self {
            gate,
            dispatcher,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

/// Handle a Flutterwave webhook.
///
/// POST /flutterwave/webhook
///
/// Runs the admission gate, then the dispatcher. Gate rejections are
/// returned as `{"error": ...}` with the stage's status code.
pub async fn handle_flutterwave_webhook(
    State(state): State<WebhookAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let source_ip = client_ip(&headers, connect_info.as_ref(), state.trust_proxy_headers);
    let request = to_webhook_request(source_ip, &headers, body);

    let admitted = match state.gate.admit(request).await {
        AdmissionDecision::Accept(admitted) => admitted,
        AdmissionDecision::Reject(reason) => return rejection_response(reason),
    };

    match state.dispatcher.process(admitted).await {
        Some(_) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        None => (StatusCode::BAD_REQUEST, Json(json!({ "status": "failed" }))).into_response(),
    }
}

fn to_webhook_request(source_ip: IpAddr, headers: &HeaderMap, body: Bytes) -> WebhookRequest {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(WebhookRequest::new(source_ip, body.to_vec()), |request, (name, value)| {
            request.with_header(name, value)
        })
}

/// Resolves the caller's IP.
///
/// When proxy headers are trusted the order is:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy_headers: bool,
) -> IpAddr {
    if trust_proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|list| list.split(',').next())
            .and_then(|first| first.trim().parse().ok());
        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(|ip| ip.trim().parse().ok())
        };
        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip;
        }
    }

    connect_info
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn rejection_response(reason: RejectReason) -> Response {
    let status =
        StatusCode::from_u16(reason.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(json!({ "error": reason.message() }))).into_response();

    if let RejectReason::RateLimited { retry_after_secs } = reason {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    }

    response
}
