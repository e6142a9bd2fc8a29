use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::verification::{StatusQuery, StatusResponse, VerificationStatus, VerifyRequest};
use crate::models::job::VerificationKey;
use crate::services::status;
use crate::services::verification::VerificationError;

type ApiError = (StatusCode, Json<Value>);

fn email_required() -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Email required" })))
}

/// POST /verify — Start (or join) verification of an email address.
pub async fn submit_verification(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload.map_err(|_| email_required())?;
    request.validate().map_err(|_| email_required())?;

    match state.verifier.submit(&request.email).await {
        Ok(status @ VerificationStatus::InProgress) => {
            Ok(Json(StatusResponse::from(status).with_message("Verification started")))
        }
        Ok(status) => Ok(Json(status.into())),
        Err(VerificationError::InvalidEmail) => Err(email_required()),
        Err(VerificationError::Submission(_)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({ "status": "FAILED", "error": "Enrichment submission failed" })),
        )),
        Err(VerificationError::Registry(_) | VerificationError::Interrupted) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "FAILED", "error": "Verification could not be started" })),
        )),
    }
}

/// GET /status?email= — Poll the status of a verification.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Json<StatusResponse> {
    let status = query
        .email
        .as_deref()
        .and_then(VerificationKey::parse)
        .map(|key| status::status_of(&state.registry, &key))
        .unwrap_or(VerificationStatus::NotStarted);

    Json(status.into())
}
