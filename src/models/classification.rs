use serde::{Deserialize, Serialize};
use strum::Display;

/// How confident the classifier is in its decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Buying-authority bucket assigned to a contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
pub enum Category {
    #[serde(rename = "Decision Maker")]
    #[strum(serialize = "Decision Maker")]
    DecisionMaker,
    Influencer,
    Unqualified,
}

/// Outcome of classifying an enriched contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub decision_maker: bool,
    pub confidence: Confidence,
    pub category: Category,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

// Enriched contact shapes as delivered by the provider. Every level is
// optional: personal addresses routinely come back with no profile at all.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(default)]
    pub contact: Option<EnrichedContact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedContact {
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: Option<String>,
}
