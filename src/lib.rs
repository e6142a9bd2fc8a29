//! Decision-Maker Verification
//!
//! This library tracks email verifications that are delegated to an external
//! enrichment provider. A verification starts a remote job, the provider later
//! posts the enriched contact to a webhook, and pollers read the classified
//! result once it has been matched back to its job by correlation id.

pub mod app_state;
pub mod config;
pub mod models;
pub mod registry;
pub mod routes;
pub mod services;
