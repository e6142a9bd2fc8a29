use serde::Deserialize;
use std::time::Duration;

use crate::services::enrichment::WEBHOOK_PATH;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Enrichment provider API key (bearer token)
    pub api_key: String,

    /// Public base URL of this service, used to build the callback target
    pub base_url: String,

    /// Provider endpoint that starts a reverse email enrichment
    #[serde(default = "default_enrich_api_url")]
    pub enrich_api_url: String,

    /// Label attached to each enrichment job on the provider side
    #[serde(default = "default_enrichment_name")]
    pub enrichment_name: String,

    /// Timeout for the outbound submission call, in seconds
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,

    /// How long a job may wait for its callback before it expires, in seconds
    #[serde(default = "default_job_expiry_secs")]
    pub job_expiry_secs: u64,

    /// Interval between expiry sweeps, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// How long a callback that beat its submission is held, in seconds
    #[serde(default = "default_callback_park_secs")]
    pub callback_park_secs: u64,

    /// Start a fresh job for keys that already completed
    #[serde(default)]
    pub reverify_completed: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_enrich_api_url() -> String {
    "https://app.fullenrich.com/api/v1/contact/reverse/email/bulk".to_string()
}

fn default_enrichment_name() -> String {
    "Decision Maker Verification".to_string()
}

fn default_submit_timeout_secs() -> u64 {
    30
}

fn default_job_expiry_secs() -> u64 {
    900
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_callback_park_secs() -> u64 {
    120
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Callback target handed to the provider with every submission.
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), WEBHOOK_PATH)
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            job_expiry: Duration::from_secs(self.job_expiry_secs),
            callback_park: Duration::from_secs(self.callback_park_secs),
            stalled_submission: Duration::from_secs(self.submit_timeout_secs.saturating_mul(2)),
        }
    }
}

/// Retention knobs for the background sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub interval: Duration,
    pub job_expiry: Duration,
    pub callback_park: Duration,
    /// NOT_STARTED jobs older than this are failed; their submission is lost.
    pub stalled_submission: Duration,
}
