//! Flutterwave webhook server.
//!
//! Loads configuration from `FLUTTERWAVE__*` environment variables, checks
//! the gateway credentials, and serves `POST /flutterwave/webhook`.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flutterwave_gateway::adapters::flutterwave::ApiClient;
use flutterwave_gateway::adapters::http::{webhook_router, ReqwestTransport, WebhookAppState};
use flutterwave_gateway::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use flutterwave_gateway::adapters::webhook_store::InMemoryWebhookEventRepository;
use flutterwave_gateway::application::{WebhookDispatcher, WebhookGate};
use flutterwave_gateway::config::{AppConfig, RedisConfig, ServerConfig};
use flutterwave_gateway::ports::{RateLimiter, WebhookEventRepository};

/// How long processed webhook keys are kept for deduplication.
const WEBHOOK_RETENTION_HOURS: i64 = 72;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let gateway = &config.gateway;
    let credential = gateway.credential()?;
    tracing::info!(
        api_version = %credential.api_version(),
        live = gateway.is_live(),
        base_url = %credential.base_url(),
        default_currency = %credential.default_currency(),
        default_country = %credential.default_country(),
        "Flutterwave client configured"
    );
    let transport = Arc::new(ReqwestTransport::new()?);
    let client = ApiClient::new(credential, transport).with_request_logging(gateway.log_requests);
    tracing::debug!(oauth = client.token_cache().is_some(), "API client ready");

    let gate_config = gateway.webhook_gate_config()?;
    if gate_config.allowed_ips.is_empty() {
        tracing::warn!("Webhook IP allow-list is empty; all source addresses are accepted");
    }
    if gate_config.secret_hash.is_none() {
        tracing::warn!("Webhook secret hash is not configured; every webhook will be refused");
    }

    let rate_limiter = build_rate_limiter(config.redis.as_ref()).await;
    let gate = WebhookGate::new(gate_config).with_rate_limiter(rate_limiter);

    let repository = Arc::new(InMemoryWebhookEventRepository::new());
    let dispatcher = WebhookDispatcher::new().with_repository(repository.clone());

    let shutdown = CancellationToken::new();
    tokio::spawn(sweep_webhook_records(repository, shutdown.clone()));

    let state = WebhookAppState::new(Arc::new(gate), Arc::new(dispatcher))
        .with_trusted_proxy_headers(gateway.webhook_trust_proxy_headers);
    let app = webhook_router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Webhook server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    tracing::info!("Webhook server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Redis when configured and reachable, otherwise per-process counters.
async fn build_rate_limiter(redis: Option<&RedisConfig>) -> Arc<dyn RateLimiter> {
    let Some(redis) = redis else {
        return Arc::new(InMemoryRateLimiter::new());
    };

    match tokio::time::timeout(redis.timeout(), RedisRateLimiter::connect(&redis.url)).await {
        Ok(Ok(limiter)) => {
            tracing::info!("Using Redis rate limiter");
            Arc::new(limiter)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory rate limiter");
            Arc::new(InMemoryRateLimiter::new())
        }
        Err(_) => {
            tracing::warn!("Redis connect timed out, falling back to in-memory rate limiter");
            Arc::new(InMemoryRateLimiter::new())
        }
    }
}

async fn sweep_webhook_records(
    repository: Arc<InMemoryWebhookEventRepository>,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(WEBHOOK_RETENTION_HOURS);
                match repository.delete_before(cutoff).await {
                    Ok(0) => {}
                    Ok(deleted) => tracing::debug!(deleted, "Expired webhook records removed"),
                    Err(e) => tracing::warn!(error = %e, "Webhook record sweep failed"),
                }
            }
        }
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
