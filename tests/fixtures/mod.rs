//! Provider callback payloads for correlation tests

use serde_json::{json, Value};

/// A contact the provider might return, with the classification it should get.
#[derive(Debug, Clone)]
pub struct ContactFixture {
    pub title: Option<&'static str>,
    pub company: Option<&'static str>,
    pub decision_maker: bool,
    pub category: &'static str,
    pub description: &'static str,
}

pub const CONTACT_FIXTURES: &[ContactFixture] = &[
    ContactFixture {
        title: Some("VP Sales"),
        company: Some("Acme"),
        decision_maker: true,
        category: "Decision Maker",
        description: "Vice president at a company",
    },
    ContactFixture {
        title: Some("Co-Founder & CTO"),
        company: Some("Initech"),
        decision_maker: true,
        category: "Decision Maker",
        description: "Founder title with punctuation",
    },
    ContactFixture {
        title: Some("Senior Account Executive"),
        company: Some("Globex"),
        decision_maker: false,
        category: "Influencer",
        description: "Individual contributor",
    },
    ContactFixture {
        title: Some("CEO"),
        company: None,
        decision_maker: false,
        category: "Unqualified",
        description: "Senior title but no company on record",
    },
    ContactFixture {
        title: None,
        company: None,
        decision_maker: false,
        category: "Unqualified",
        description: "Personal address with no profile",
    },
];

/// Enriched contact body for a fixture, shaped like the provider's `contact`.
pub fn contact_json(fixture: &ContactFixture) -> Value {
    match (fixture.title, fixture.company) {
        (None, None) => json!({}),
        (title, company) => {
            let mut position = json!({});
            if let Some(title) = title {
                position["title"] = json!(title);
            }
            if let Some(company) = company {
                position["company"] = json!({ "name": company });
            }
            json!({ "profile": { "position": position } })
        }
    }
}

/// Full webhook body as the provider posts it.
pub fn callback_body(correlation_id: &str, contact: Value) -> Value {
    json!({
        "id": correlation_id,
        "name": "Decision Maker Verification",
        "status": "FINISHED",
        "datas": [{ "contact": contact }]
    })
}

/// The VP Sales at Acme callback used by most scenarios.
pub fn vp_sales_callback(correlation_id: &str) -> Value {
    callback_body(correlation_id, contact_json(&CONTACT_FIXTURES[0]))
}
