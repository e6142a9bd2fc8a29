use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::classification::ClassificationResult;
use crate::models::job::{CorrelationId, VerificationKey};

/// Upper bound on callbacks held while waiting for their job to be attached.
/// Callbacks are unauthenticated, so this caps what a flood of forged ids can pin.
const MAX_PARKED: usize = 10_000;

/// What happened to a callback offered for parking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkOutcome {
    /// Held until its correlation id is attached or the park window lapses.
    Parked,
    /// The id was attached in the meantime; the caller should match it again.
    AlreadyBound,
    /// The id was already parked; the first delivery wins.
    Duplicate,
    /// The parking area is full and the callback was dropped.
    Full,
}

struct ParkedCallback {
    result: ClassificationResult,
    received_at: DateTime<Utc>,
}

/// Correlation id → owning key, plus callbacks that arrived before their id
/// was attached. Lives behind the registry's correlation lock.
#[derive(Default)]
pub(crate) struct CorrelationIndex {
    bound: HashMap<CorrelationId, VerificationKey>,
    parked: HashMap<CorrelationId, ParkedCallback>,
}

impl CorrelationIndex {
    pub(crate) fn key_for(&self, id: &CorrelationId) -> Option<&VerificationKey> {
        self.bound.get(id)
    }

    pub(crate) fn is_bound(&self, id: &CorrelationId) -> bool {
        self.bound.contains_key(id)
    }

    /// Bind `id` to `key` and hand back any callback that was waiting for it.
    pub(crate) fn bind(
        &mut self,
        id: CorrelationId,
        key: VerificationKey,
    ) -> Option<ClassificationResult> {
        let parked = self.parked.remove(&id).map(|p| p.result);
        self.bound.insert(id, key);
        parked
    }

    pub(crate) fn unbind(&mut self, id: &CorrelationId) {
        self.bound.remove(id);
    }

    pub(crate) fn park(
        &mut self,
        id: CorrelationId,
        result: ClassificationResult,
        now: DateTime<Utc>,
    ) -> ParkOutcome {
        if self.bound.contains_key(&id) {
            return ParkOutcome::AlreadyBound;
        }
        if self.parked.contains_key(&id) {
            return ParkOutcome::Duplicate;
        }
        if self.parked.len() >= MAX_PARKED {
            return ParkOutcome::Full;
        }
        self.parked.insert(
            id,
            ParkedCallback {
                result,
                received_at: now,
            },
        );
        ParkOutcome::Parked
    }

    /// Drop parked callbacks received at or before `cutoff`.
    pub(crate) fn discard_parked_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.parked.len();
        self.parked.retain(|_, p| p.received_at > cutoff);
        before - self.parked.len()
    }

    pub(crate) fn parked_len(&self) -> usize {
        self.parked.len()
    }
}
