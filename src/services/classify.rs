use crate::models::classification::{Category, ClassificationResult, Confidence, EnrichedContact};

/// Title fragments that indicate buying authority. Matched case-insensitively
/// as substrings, so "Co-Founder" and "SVP Sales" both qualify.
const SENIOR_KEYWORDS: &[&str] = &[
    "founder",
    "co-founder",
    "ceo",
    "chief",
    "vp",
    "vice president",
    "director",
    "head",
    "associate director",
];

/// Classify an enriched contact as decision maker, influencer, or unqualified.
///
/// A contact with no profile or no current company is treated as a personal
/// address regardless of any title it carries.
pub fn classify(contact: Option<&EnrichedContact>) -> ClassificationResult {
    let position = contact
        .and_then(|c| c.profile.as_ref())
        .and_then(|p| p.position.as_ref());

    let Some((position, company)) = position.and_then(|p| p.company.as_ref().map(|c| (p, c)))
    else {
        return ClassificationResult {
            decision_maker: false,
            confidence: Confidence::Low,
            category: Category::Unqualified,
            reason: "Personal email or no verifiable company data".to_string(),
            title: None,
            company: None,
            suggested_action: Some("Skip outbound or find work email via LinkedIn".to_string()),
        };
    };

    let title = position.title.as_deref().unwrap_or_default().to_lowercase();
    let decision_maker = SENIOR_KEYWORDS.iter().any(|k| title.contains(k));

    let (confidence, category, reason) = if decision_maker {
        (
            Confidence::High,
            Category::DecisionMaker,
            "Senior leadership role with buying authority",
        )
    } else {
        (
            Confidence::Medium,
            Category::Influencer,
            "Mid-level role with influence but limited authority",
        )
    };

    ClassificationResult {
        decision_maker,
        confidence,
        category,
        reason: reason.to_string(),
        title: position.title.clone(),
        company: company.name.clone(),
        suggested_action: None,
    }
}
