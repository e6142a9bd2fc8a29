use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::SweepSettings;
use crate::registry::JobRegistry;

/// Outcome of one sweep pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub stalled: usize,
    pub parked_discarded: usize,
}

/// Reason recorded on a job whose submission never reported back.
pub const SUBMISSION_STALLED: &str = "Enrichment submission did not complete";

/// Expire jobs whose callback never came, fail jobs whose submission never
/// returned, and drop stale parked callbacks.
pub fn sweep_once(registry: &JobRegistry, settings: &SweepSettings) -> SweepReport {
    let expired = registry.sweep_expired(settings.job_expiry);
    for key in &expired {
        tracing::warn!(key = %key, "Verification expired without a callback");
    }
    metrics::counter!("verification_jobs_expired").increment(expired.len() as u64);

    let stalled = registry.fail_stalled(settings.stalled_submission, SUBMISSION_STALLED);
    for key in &stalled {
        tracing::warn!(key = %key, "Submission never completed; job failed");
    }
    metrics::counter!("verification_submissions_failed").increment(stalled.len() as u64);

    let parked_discarded = registry.discard_parked(settings.callback_park);
    if parked_discarded > 0 {
        tracing::info!(count = parked_discarded, "Discarded unclaimed callbacks");
    }

    SweepReport {
        expired: expired.len(),
        stalled: stalled.len(),
        parked_discarded,
    }
}

/// Run `sweep_once` every `settings.interval` until the task is dropped.
pub async fn run(registry: Arc<JobRegistry>, settings: SweepSettings) {
    tracing::info!(
        interval_secs = settings.interval.as_secs(),
        expiry_secs = settings.job_expiry.as_secs(),
        "Starting expiry sweep"
    );

    let mut ticker = interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let report = sweep_once(&registry, &settings);
        tracing::trace!(expired = report.expired, "Sweep pass finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{CorrelationId, JobState, VerificationKey};
    use crate::services::classify::classify;
    use std::time::Duration;

    fn settings(job_expiry: Duration) -> SweepSettings {
        SweepSettings {
            interval: Duration::from_millis(10),
            job_expiry,
            callback_park: job_expiry,
            stalled_submission: job_expiry,
        }
    }

    #[test]
    fn test_sweep_once_reports() {
        let registry = JobRegistry::default();
        let key = VerificationKey::parse("a@x.com").unwrap();
        registry.get_or_create(&key);
        registry.attach_correlation(&key, CorrelationId::new("c-1")).unwrap();
        registry.park(CorrelationId::new("stray"), classify(None));

        assert_eq!(
            sweep_once(&registry, &settings(Duration::from_secs(3600))),
            SweepReport::default()
        );
        assert_eq!(
            sweep_once(&registry, &settings(Duration::ZERO)),
            SweepReport {
                expired: 1,
                stalled: 0,
                parked_discarded: 1
            }
        );
        assert_eq!(registry.snapshot(&key).unwrap().state, JobState::Expired);
    }

    #[test]
    fn test_sweep_once_fails_stalled_submissions() {
        let registry = JobRegistry::default();
        let key = VerificationKey::parse("stuck@x.com").unwrap();
        registry.get_or_create(&key);

        assert_eq!(sweep_once(&registry, &settings(Duration::from_secs(3600))).stalled, 0);
        assert_eq!(sweep_once(&registry, &settings(Duration::ZERO)).stalled, 1);

        let record = registry.snapshot(&key).unwrap();
        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.error.as_deref(), Some(SUBMISSION_STALLED));
        assert!(registry.get_or_create(&key).1);
    }

    #[tokio::test]
    async fn test_background_sweep_expires_jobs() {
        let registry = Arc::new(JobRegistry::default());
        let key = VerificationKey::parse("slow@x.com").unwrap();
        registry.get_or_create(&key);
        registry.attach_correlation(&key, CorrelationId::new("c-1")).unwrap();

        let handle = tokio::spawn(run(registry.clone(), settings(Duration::ZERO)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(registry.snapshot(&key).unwrap().state, JobState::Expired);
    }
}
