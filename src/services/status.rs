use crate::models::job::{JobRecord, JobState, VerificationKey};
use crate::models::verification::VerificationStatus;
use crate::registry::JobRegistry;

/// Current wire status for `key`. Keys the registry has never seen read as
/// NOT_STARTED.
pub fn status_of(registry: &JobRegistry, key: &VerificationKey) -> VerificationStatus {
    registry
        .snapshot(key)
        .map(|record| status_from_record(&record))
        .unwrap_or(VerificationStatus::NotStarted)
}

pub fn status_from_record(record: &JobRecord) -> VerificationStatus {
    match record.state {
        JobState::NotStarted => VerificationStatus::NotStarted,
        JobState::InProgress => VerificationStatus::InProgress,
        JobState::Completed => match &record.result {
            Some(result) => VerificationStatus::Completed(result.clone()),
            None => VerificationStatus::Failed("Result unavailable".to_string()),
        },
        JobState::Failed => VerificationStatus::Failed(
            record
                .error
                .clone()
                .unwrap_or_else(|| "Verification failed".to_string()),
        ),
        JobState::Expired => VerificationStatus::Expired,
    }
}
