use std::sync::Arc;

use crate::models::classification::EnrichedRecord;
use crate::models::job::{CorrelationId, VerificationKey};
use crate::models::verification::CallbackEvent;
use crate::registry::{JobRegistry, ParkOutcome, RegistryError};
use crate::services::classify::classify;

/// What became of one inbound callback. Every variant is acknowledged to the
/// provider; the distinction only matters for logs, metrics and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Completed(VerificationKey),
    /// Arrived before its job was attached; held for a short window.
    Parked(CorrelationId),
    /// Stale, duplicate or forged id. Nothing changed.
    Unmatched(CorrelationId),
    Malformed,
}

/// Resolves provider callbacks to jobs strictly by correlation id.
pub struct CallbackCorrelator {
    registry: Arc<JobRegistry>,
}

impl CallbackCorrelator {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    /// Classify the callback payload and complete the job it belongs to.
    ///
    /// Never fails: malformed and unmatched callbacks are logged and dropped so
    /// the provider does not keep redelivering them.
    pub fn handle(&self, event: CallbackEvent) -> CallbackOutcome {
        let provider_status = event.status.clone();
        let (id, record) = match extract(event) {
            Ok(parts) => parts,
            Err(e) => {
                match &e {
                    CallbackError::MissingCorrelation => tracing::error!(
                        error = %e,
                        provider_status = ?provider_status,
                        "Callback cannot be matched to any job"
                    ),
                    CallbackError::MissingPayload(_) => tracing::warn!(
                        error = %e,
                        provider_status = ?provider_status,
                        "Dropping malformed callback"
                    ),
                }
                metrics::counter!("verification_callbacks_malformed").increment(1);
                return CallbackOutcome::Malformed;
            }
        };

        let result = classify(record.contact.as_ref());
        tracing::debug!(
            correlation_id = %id,
            provider_status = ?provider_status,
            category = %result.category,
            "Callback classified"
        );

        match self.registry.complete_by_correlation(&id, result.clone()) {
            Ok(key) => return self.completed(key, &id),
            Err(RegistryError::UnknownCorrelation(_)) => {}
            Err(e) => {
                tracing::error!(correlation_id = %id, error = %e, "Registry rejected callback");
                return self.unmatched(id);
            }
        }

        match self.registry.park(id.clone(), result.clone()) {
            ParkOutcome::Parked => {
                tracing::info!(correlation_id = %id, "Callback arrived before its job; parked");
                CallbackOutcome::Parked(id)
            }
            // Attached between the lookup and the park; one more try settles it.
            ParkOutcome::AlreadyBound => match self.registry.complete_by_correlation(&id, result) {
                Ok(key) => self.completed(key, &id),
                Err(_) => self.unmatched(id),
            },
            ParkOutcome::Duplicate | ParkOutcome::Full => self.unmatched(id),
        }
    }

    fn completed(&self, key: VerificationKey, id: &CorrelationId) -> CallbackOutcome {
        tracing::info!(key = %key, correlation_id = %id, "Verification completed");
        metrics::counter!("verification_jobs_completed").increment(1);
        CallbackOutcome::Completed(key)
    }

    fn unmatched(&self, id: CorrelationId) -> CallbackOutcome {
        tracing::warn!(correlation_id = %id, "Ignoring callback for unknown or finished job");
        metrics::counter!("verification_callbacks_unmatched").increment(1);
        CallbackOutcome::Unmatched(id)
    }
}

/// Pull the correlation id and the first enriched record out of a callback.
pub fn extract(event: CallbackEvent) -> Result<(CorrelationId, EnrichedRecord), CallbackError> {
    let id = event
        .id
        .filter(|id| !id.trim().is_empty())
        .map(CorrelationId::new)
        .ok_or(CallbackError::MissingCorrelation)?;

    let record = event
        .datas
        .and_then(|datas| datas.into_iter().next())
        .ok_or_else(|| CallbackError::MissingPayload(id.clone()))?;

    Ok((id, record))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CallbackError {
    #[error("Malformed callback: no correlation id")]
    MissingCorrelation,

    #[error("Malformed callback for {0}: no enrichment data")]
    MissingPayload(CorrelationId),
}
