use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::job::{CorrelationId, VerificationKey};

/// Path on this service where the provider delivers results.
pub const WEBHOOK_PATH: &str = "/api/enrich/webhook";

/// Outbound side of the enrichment provider.
///
/// `submit` starts one remote enrichment and returns the provider's id for it.
/// The result arrives later through the webhook, tagged with that id.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn submit(&self, key: &VerificationKey) -> Result<CorrelationId, SubmissionError>;
}

/// Client for the FullEnrich reverse email lookup API.
pub struct FullEnrichClient {
    http: Client,
    api_url: String,
    api_key: String,
    webhook_url: String,
    job_name: String,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    name: &'a str,
    webhook_url: &'a str,
    data: [ContactInput<'a>; 1],
}

#[derive(Serialize)]
struct ContactInput<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct BulkResponse {
    enrichment_id: Option<String>,
}

impl FullEnrichClient {
    pub fn new(
        api_url: String,
        api_key: String,
        webhook_url: String,
        job_name: String,
        timeout: Duration,
    ) -> Result<Self, SubmissionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SubmissionError::Http)?;
        Ok(Self {
            http,
            api_url,
            api_key,
            webhook_url,
            job_name,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SubmissionError> {
        Self::new(
            config.enrich_api_url.clone(),
            config.api_key.clone(),
            config.webhook_url(),
            config.enrichment_name.clone(),
            Duration::from_secs(config.submit_timeout_secs),
        )
    }
}

#[async_trait]
impl EnrichmentProvider for FullEnrichClient {
    async fn submit(&self, key: &VerificationKey) -> Result<CorrelationId, SubmissionError> {
        let body = BulkRequest {
            name: &self.job_name,
            webhook_url: &self.webhook_url,
            data: [ContactInput { email: key.as_str() }],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(SubmissionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: BulkResponse = response.json().await.map_err(SubmissionError::Http)?;
        let id = parsed
            .enrichment_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(SubmissionError::MissingCorrelation)?;

        tracing::info!(key = %key, correlation_id = %id, "Enrichment job started");
        Ok(CorrelationId::new(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected submission with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Provider response carried no enrichment id")]
    MissingCorrelation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let key = VerificationKey::parse("a@x.com").unwrap();
        let body = BulkRequest {
            name: "Decision Maker Verification",
            webhook_url: "https://svc.example/api/enrich/webhook",
            data: [ContactInput { email: key.as_str() }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "name": "Decision Maker Verification",
                "webhook_url": "https://svc.example/api/enrich/webhook",
                "data": [{ "email": "a@x.com" }]
            })
        );
    }

    #[test]
    fn test_response_without_id() {
        let parsed: BulkResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(parsed.enrichment_id.is_none());
    }
}
