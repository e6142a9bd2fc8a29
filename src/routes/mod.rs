use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;
use crate::services::enrichment::WEBHOOK_PATH;

pub mod ops;
pub mod verify;
pub mod webhook;

/// API routes with state applied. Metrics and middleware are layered on by
/// the binary.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health_check))
        .route("/verify", post(verify::submit_verification))
        .route("/status", get(verify::get_status))
        .route(WEBHOOK_PATH, post(webhook::receive_callback))
        .with_state(state)
}
