use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use decision_maker_verify::{
    app_state::AppState,
    config::AppConfig,
    registry::JobRegistry,
    routes,
    services::{enrichment::FullEnrichClient, sweeper},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing decision-maker-verify server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "verification_jobs_total",
        "Verification jobs submitted to the enrichment provider"
    );
    metrics::describe_counter!(
        "verification_submissions_failed",
        "Provider submissions that failed"
    );
    metrics::describe_counter!(
        "verification_jobs_completed",
        "Verification jobs completed by a matching callback"
    );
    metrics::describe_counter!(
        "verification_jobs_expired",
        "Verification jobs expired without a callback"
    );
    metrics::describe_counter!(
        "verification_callbacks_unmatched",
        "Callbacks whose correlation id matched no running job"
    );
    metrics::describe_counter!(
        "verification_callbacks_malformed",
        "Callbacks dropped as malformed"
    );

    tracing::info!(webhook_url = %config.webhook_url(), "Initializing enrichment client");
    let provider =
        FullEnrichClient::from_config(&config).expect("Failed to initialize enrichment client");

    let registry = Arc::new(JobRegistry::new(config.reverify_completed));
    let state = AppState::new(registry.clone(), Arc::new(provider));

    // Expire jobs whose callback never arrives
    let sweep = tokio::spawn(sweeper::run(registry, config.sweep_settings()));

    let app = routes::api_router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::ops::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1 MB limit

    tracing::info!("Starting decision-maker-verify on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    sweep.abort();
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
