use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use token_sentinel::{
    alert::WebhookTransport,
    config::Config,
    scheduler::{Scheduler, SharedStatus},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USER_AGENT: &str = concat!("token-sentinel/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("token_sentinel=info")),
        )
        .init();

    info!("==================================================");
    info!("  TOKEN SENTINEL - valuation anomaly alerts");
    info!("==================================================");

    let config = Config::from_env()?;
    info!("Chain namespace: {}", config.chain_namespace);
    info!("Sources: {}", config.sources.len());
    info!("Enrichment URL: {}", config.enrichment_base_url);
    if config.alert_webhook_url.is_none() {
        warn!("ALERT_WEBHOOK_URL not set; triggered alerts will be logged and dropped");
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.http_timeout)
        .build()?;

    let transport = Arc::new(WebhookTransport::new(client.clone()));
    let scheduler = Scheduler::from_config(&config, client, transport);
    let status = scheduler.status();

    let shutdown = CancellationToken::new();
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

    let app = Router::new()
        .route("/", get(alive))
        .route("/health", get(health))
        .route("/api/status", get(status_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(status);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Status server running on port {}", config.port);

    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    shutdown.cancel();

    // A running cycle finishes first; its requests are bounded by the HTTP timeout.
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task ended abnormally: {}", e);
    }
    match tokio::time::timeout(Duration::from_secs(5), server).await {
        Ok(Ok(Err(e))) => error!("Status server error: {}", e),
        Ok(Err(e)) => error!("Status server task ended abnormally: {}", e),
        Err(_) => warn!("Status server did not stop within 5s"),
        Ok(Ok(Ok(()))) => {}
    }

    info!("Shutdown complete");
    Ok(())
}

async fn alive() -> &'static str {
    "I'm alive!"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "token-sentinel",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn status_handler(State(status): State<SharedStatus>) -> Json<serde_json::Value> {
    let snapshot = status.read().await.clone();
    Json(serde_json::json!({
        "scheduler": snapshot,
        "timestamp": Utc::now().to_rfc3339()
    }))
}
