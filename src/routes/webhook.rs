use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use crate::app_state::AppState;
use crate::models::verification::CallbackEvent;

/// POST /api/enrich/webhook — Provider callback.
///
/// Always answers 200 so the provider never retries; anything that cannot be
/// applied is logged and dropped.
pub async fn receive_callback(State(state): State<AppState>, body: Bytes) -> (StatusCode, &'static str) {
    match serde_json::from_slice::<CallbackEvent>(&body) {
        Ok(event) => {
            let outcome = state.correlator.handle(event);
            tracing::debug!(outcome = ?outcome, "Callback handled");
        }
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Dropping unparseable callback");
            metrics::counter!("verification_callbacks_malformed").increment(1);
        }
    }

    (StatusCode::OK, "OK")
}
