//! Axum router configuration for the webhook endpoint.

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{handle_flutterwave_webhook, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /flutterwave/webhook` - Gateway callbacks (IP, rate and signature checked)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/flutterwave/webhook", post(handle_flutterwave_webhook))
}

/// Create the complete webhook application.
///
/// The body limit backs the gate's `Content-Length` check for requests
/// that omit or understate the header.
pub fn webhook_router(state: WebhookAppState) -> Router {
    let body_limit = usize::try_from(state.gate.config().max_body_size).unwrap_or(usize::MAX);

    webhook_routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
