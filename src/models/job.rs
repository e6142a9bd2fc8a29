use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::classification::ClassificationResult;

/// Normalized identity under verification: a trimmed, lower-cased email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationKey(String);

impl VerificationKey {
    /// Normalize a raw email. Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier assigned by the enrichment provider at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of a verification job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    Expired,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Expired)
    }
}

/// One attempt to verify a single identity.
///
/// Only the registry holds these mutably; everything else sees clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub key: VerificationKey,
    pub state: JobState,
    pub correlation_id: Option<CorrelationId>,
    pub result: Option<ClassificationResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(key: VerificationKey) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            key,
            state: JobState::NotStarted,
            correlation_id: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        let a = VerificationKey::parse("  Jane.Doe@Example.COM ").unwrap();
        let b = VerificationKey::parse("jane.doe@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "jane.doe@example.com");
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(VerificationKey::parse("").is_none());
        assert!(VerificationKey::parse("   \t").is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::NotStarted.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Expired.is_terminal());
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(JobState::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(
            serde_json::to_value(JobState::NotStarted).unwrap(),
            serde_json::json!("NOT_STARTED")
        );
    }
}
