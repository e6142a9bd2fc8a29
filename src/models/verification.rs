use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::classification::{ClassificationResult, EnrichedRecord};
use crate::models::job::JobState;

/// Request to verify an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[garde(length(max = 320))]
    #[serde(default)]
    pub email: String,
}

/// Query string for polling a verification.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub email: Option<String>,
}

/// Wire-visible status of a verification, as seen by pollers.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationStatus {
    NotStarted,
    InProgress,
    Completed(ClassificationResult),
    Failed(String),
    Expired,
}

impl VerificationStatus {
    pub fn state(&self) -> JobState {
        match self {
            VerificationStatus::NotStarted => JobState::NotStarted,
            VerificationStatus::InProgress => JobState::InProgress,
            VerificationStatus::Completed(_) => JobState::Completed,
            VerificationStatus::Failed(_) => JobState::Failed,
            VerificationStatus::Expired => JobState::Expired,
        }
    }
}

/// Response body for both `/verify` and `/status`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<VerificationStatus> for StatusResponse {
    fn from(status: VerificationStatus) -> Self {
        let state = status.state();
        let (result, error) = match status {
            VerificationStatus::Completed(result) => (Some(result), None),
            VerificationStatus::Failed(reason) => (None, Some(reason)),
            _ => (None, None),
        };
        Self {
            status: state,
            result,
            message: None,
            error,
        }
    }
}

/// Inbound completion event posted by the enrichment provider.
///
/// The provider labels its job identifier `id` in webhooks and `enrichment_id`
/// in submission responses; both spellings are accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackEvent {
    #[serde(default, alias = "enrichment_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub datas: Option<Vec<EnrichedRecord>>,
}
