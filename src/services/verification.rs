use std::sync::Arc;

use crate::models::job::VerificationKey;
use crate::models::verification::VerificationStatus;
use crate::registry::{JobRegistry, RegistryError};
use crate::services::enrichment::{EnrichmentProvider, SubmissionError};
use crate::services::status::status_from_record;
use uuid::Uuid;

/// Reason recorded on a job whose submission failed. Provider details stay in
/// the logs.
pub const SUBMISSION_FAILED: &str = "Enrichment submission failed";

/// Starts verifications: one provider submission per new job, never more.
pub struct VerificationService {
    registry: Arc<JobRegistry>,
    provider: Arc<dyn EnrichmentProvider>,
}

impl VerificationService {
    pub fn new(registry: Arc<JobRegistry>, provider: Arc<dyn EnrichmentProvider>) -> Self {
        Self { registry, provider }
    }

    /// Verify `email`, starting a provider job only if no live job exists for it.
    ///
    /// Concurrent calls for the same address share one job: only the caller
    /// that created the record submits, everyone else gets its current status.
    /// The submission runs on its own task, so a caller that goes away
    /// mid-request cannot leave the record stranded in NOT_STARTED.
    pub async fn submit(&self, email: &str) -> Result<VerificationStatus, VerificationError> {
        let key = VerificationKey::parse(email).ok_or(VerificationError::InvalidEmail)?;

        let (record, created) = self.registry.get_or_create(&key);
        if !created {
            tracing::debug!(key = %key, state = %record.state, "Verification already known");
            return Ok(status_from_record(&record));
        }

        metrics::counter!("verification_jobs_total").increment(1);

        let job_id = record.job_id;
        let task = tokio::spawn(start_job(
            self.registry.clone(),
            self.provider.clone(),
            key.clone(),
            job_id,
        ));

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Submission task died");
                mark_failed(&self.registry, &key, job_id);
                Err(VerificationError::Interrupted)
            }
        }
    }
}

/// Submit `key` to the provider and attach the returned id to job `job_id`.
async fn start_job(
    registry: Arc<JobRegistry>,
    provider: Arc<dyn EnrichmentProvider>,
    key: VerificationKey,
    job_id: Uuid,
) -> Result<VerificationStatus, VerificationError> {
    let id = match provider.submit(&key).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Enrichment submission failed");
            metrics::counter!("verification_submissions_failed").increment(1);
            mark_failed(&registry, &key, job_id);
            return Err(VerificationError::Submission(e));
        }
    };

    match registry.attach_job(&key, job_id, id.clone()) {
        Ok(record) => {
            tracing::info!(key = %key, correlation_id = %id, "Verification started");
            Ok(status_from_record(&record))
        }
        Err(e) => {
            tracing::error!(key = %key, correlation_id = %id, error = %e, "Could not attach correlation id");
            mark_failed(&registry, &key, job_id);
            Err(VerificationError::Registry(e))
        }
    }
}

fn mark_failed(registry: &JobRegistry, key: &VerificationKey, job_id: Uuid) {
    if let Err(e) = registry.fail_job(key, job_id, SUBMISSION_FAILED) {
        tracing::warn!(key = %key, error = %e, "Could not mark job failed");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Email required")]
    InvalidEmail,

    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Submission was interrupted")]
    Interrupted,
}
