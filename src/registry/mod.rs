//! In-memory job registry.
//!
//! Owns every [`JobRecord`] and exposes only atomic lifecycle operations.
//! Each key has its own slot mutex so unrelated verifications never contend;
//! the outer map lock is taken for writing only when a record is created or
//! replaced.
//!
//! Lock order is always: job map, then a record slot, then the correlation
//! index. No lock is held across an `.await`.

mod correlation;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::classification::ClassificationResult;
use crate::models::job::{CorrelationId, JobRecord, JobState, VerificationKey};

use correlation::CorrelationIndex;
pub use correlation::ParkOutcome;

type Slot = Arc<Mutex<JobRecord>>;

/// Job counts by state, for health reporting.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub expired: usize,
    pub parked_callbacks: usize,
}

pub struct JobRegistry {
    jobs: RwLock<HashMap<VerificationKey, Slot>>,
    correlations: Mutex<CorrelationIndex>,
    reverify_completed: bool,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl JobRegistry {
    /// `reverify_completed` decides whether a key that already reached
    /// COMPLETED may start a fresh job. FAILED and EXPIRED keys always may.
    pub fn new(reverify_completed: bool) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            correlations: Mutex::new(CorrelationIndex::default()),
            reverify_completed,
        }
    }

    fn slot(&self, key: &VerificationKey) -> Option<Slot> {
        self.jobs.read().get(key).cloned()
    }

    fn replaceable(&self, record: &JobRecord) -> bool {
        record.state.is_terminal() && (record.state != JobState::Completed || self.reverify_completed)
    }

    /// Lock the slot for `key`, optionally insisting it still holds job `job_id`.
    fn locked(
        &self,
        key: &VerificationKey,
        job_id: Option<Uuid>,
    ) -> Result<ArcMutexGuard<RawMutex, JobRecord>, RegistryError> {
        let slot = self
            .slot(key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        let record = slot.lock_arc();
        match job_id {
            Some(expected) if record.job_id != expected => {
                Err(RegistryError::Superseded(key.clone()))
            }
            _ => Ok(record),
        }
    }

    /// Return the live record for `key`, or create a NOT_STARTED one.
    ///
    /// `created` is true for exactly one of any number of concurrent callers.
    pub fn get_or_create(&self, key: &VerificationKey) -> (JobRecord, bool) {
        if let Some(slot) = self.slot(key) {
            let record = slot.lock();
            if !self.replaceable(&record) {
                return (record.clone(), false);
            }
        }

        let mut jobs = self.jobs.write();
        if let Some(slot) = jobs.get(key) {
            let record = slot.lock();
            if !self.replaceable(&record) {
                return (record.clone(), false);
            }
            if let Some(old) = &record.correlation_id {
                self.correlations.lock().unbind(old);
            }
        }

        let record = JobRecord::new(key.clone());
        jobs.insert(key.clone(), Arc::new(Mutex::new(record.clone())));
        (record, true)
    }

    /// Move `key` from NOT_STARTED to IN_PROGRESS under `id`.
    ///
    /// If the provider's callback for `id` already arrived and was parked, the
    /// job completes inside the same critical section.
    pub fn attach_correlation(
        &self,
        key: &VerificationKey,
        id: CorrelationId,
    ) -> Result<JobRecord, RegistryError> {
        self.attach(key, None, id)
    }

    /// Like `attach_correlation`, but only if `key` still holds job `job_id`.
    /// A submission that outlived its record must not attach to a newer one.
    pub fn attach_job(
        &self,
        key: &VerificationKey,
        job_id: Uuid,
        id: CorrelationId,
    ) -> Result<JobRecord, RegistryError> {
        self.attach(key, Some(job_id), id)
    }

    fn attach(
        &self,
        key: &VerificationKey,
        job_id: Option<Uuid>,
        id: CorrelationId,
    ) -> Result<JobRecord, RegistryError> {
        let mut record = self.locked(key, job_id)?;

        if record.state != JobState::NotStarted {
            return Err(RegistryError::InvalidTransition {
                key: key.clone(),
                from: record.state,
                to: JobState::InProgress,
            });
        }

        let parked = {
            let mut index = self.correlations.lock();
            if index.is_bound(&id) {
                return Err(RegistryError::DuplicateCorrelation(id));
            }
            index.bind(id.clone(), key.clone())
        };

        record.correlation_id = Some(id);
        record.state = JobState::InProgress;
        if let Some(result) = parked {
            record.state = JobState::Completed;
            record.result = Some(result);
            record.completed_at = Some(Utc::now());
        }
        Ok(record.clone())
    }

    /// Complete the IN_PROGRESS job that was submitted under `id`.
    ///
    /// Ids that were never issued, already delivered, or belong to a job that
    /// has since expired all fail with `UnknownCorrelation` and change nothing.
    pub fn complete_by_correlation(
        &self,
        id: &CorrelationId,
        result: ClassificationResult,
    ) -> Result<VerificationKey, RegistryError> {
        let key = self
            .correlations
            .lock()
            .key_for(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownCorrelation(id.clone()))?;
        let slot = self
            .slot(&key)
            .ok_or_else(|| RegistryError::UnknownCorrelation(id.clone()))?;
        let mut record = slot.lock();

        if record.correlation_id.as_ref() != Some(id) || record.state != JobState::InProgress {
            return Err(RegistryError::UnknownCorrelation(id.clone()));
        }

        record.state = JobState::Completed;
        record.result = Some(result);
        record.completed_at = Some(Utc::now());
        Ok(key)
    }

    /// Hold a callback whose id is not bound yet, for a later `attach_correlation`.
    ///
    /// Callbacks are unauthenticated, so this relies on provider ids being
    /// unguessable: a parked result for an id the provider later issues will
    /// complete that job.
    pub fn park(&self, id: CorrelationId, result: ClassificationResult) -> ParkOutcome {
        self.correlations.lock().park(id, result, Utc::now())
    }

    /// Mark a job whose submission failed so its key can be retried.
    pub fn fail(&self, key: &VerificationKey, reason: impl Into<String>) -> Result<(), RegistryError> {
        self.fail_with(key, None, reason.into())
    }

    /// Like `fail`, but only if `key` still holds job `job_id`.
    pub fn fail_job(
        &self,
        key: &VerificationKey,
        job_id: Uuid,
        reason: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.fail_with(key, Some(job_id), reason.into())
    }

    fn fail_with(
        &self,
        key: &VerificationKey,
        job_id: Option<Uuid>,
        reason: String,
    ) -> Result<(), RegistryError> {
        let mut record = self.locked(key, job_id)?;

        if record.state != JobState::NotStarted {
            return Err(RegistryError::InvalidTransition {
                key: key.clone(),
                from: record.state,
                to: JobState::Failed,
            });
        }

        record.state = JobState::Failed;
        record.error = Some(reason);
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn snapshot(&self, key: &VerificationKey) -> Result<JobRecord, RegistryError> {
        self.slot(key)
            .map(|slot| slot.lock().clone())
            .ok_or_else(|| RegistryError::NotFound(key.clone()))
    }

    /// Expire every IN_PROGRESS job created more than `older_than` ago.
    /// Returns the keys that were expired.
    pub fn sweep_expired(&self, older_than: Duration) -> Vec<VerificationKey> {
        let Some(cutoff) = cutoff(Utc::now(), older_than) else {
            return Vec::new();
        };
        let slots: Vec<Slot> = self.jobs.read().values().cloned().collect();

        let mut expired = Vec::new();
        for slot in slots {
            let mut record = slot.lock();
            if record.state == JobState::InProgress && record.created_at <= cutoff {
                record.state = JobState::Expired;
                record.completed_at = Some(Utc::now());
                expired.push(record.key.clone());
            }
        }
        expired
    }

    /// Fail every NOT_STARTED job created more than `older_than` ago, with
    /// `reason`. Frees keys whose submission never reported back.
    pub fn fail_stalled(&self, older_than: Duration, reason: &str) -> Vec<VerificationKey> {
        let Some(cutoff) = cutoff(Utc::now(), older_than) else {
            return Vec::new();
        };
        let slots: Vec<Slot> = self.jobs.read().values().cloned().collect();

        let mut failed = Vec::new();
        for slot in slots {
            let mut record = slot.lock();
            if record.state == JobState::NotStarted && record.created_at <= cutoff {
                record.state = JobState::Failed;
                record.error = Some(reason.to_string());
                record.completed_at = Some(Utc::now());
                failed.push(record.key.clone());
            }
        }
        failed
    }

    /// Drop parked callbacks that waited longer than `older_than`.
    pub fn discard_parked(&self, older_than: Duration) -> usize {
        match cutoff(Utc::now(), older_than) {
            Some(cutoff) => self.correlations.lock().discard_parked_before(cutoff),
            None => 0,
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let slots: Vec<Slot> = self.jobs.read().values().cloned().collect();
        let mut stats = RegistryStats::default();
        for slot in slots {
            let state = slot.lock().state;
            match state {
                JobState::NotStarted => stats.not_started += 1,
                JobState::InProgress => stats.in_progress += 1,
                JobState::Completed => stats.completed += 1,
                JobState::Failed => stats.failed += 1,
                JobState::Expired => stats.expired += 1,
            }
        }
        stats.parked_callbacks = self.correlations.lock().parked_len();
        stats
    }
}

fn cutoff(now: DateTime<Utc>, older_than: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(older_than)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("No verification job for {0}")]
    NotFound(VerificationKey),

    #[error("Invalid transition for {key}: {from} -> {to}")]
    InvalidTransition {
        key: VerificationKey,
        from: JobState,
        to: JobState,
    },

    #[error("Unknown correlation id {0}")]
    UnknownCorrelation(CorrelationId),

    #[error("Correlation id {0} is already bound to a job")]
    DuplicateCorrelation(CorrelationId),

    #[error("Job for {0} was replaced by a newer one")]
    Superseded(VerificationKey),
}
