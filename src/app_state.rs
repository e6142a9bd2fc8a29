use std::sync::Arc;

use crate::registry::JobRegistry;
use crate::services::{
    correlator::CallbackCorrelator,
    enrichment::EnrichmentProvider,
    verification::VerificationService,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub verifier: Arc<VerificationService>,
    pub correlator: Arc<CallbackCorrelator>,
}

impl AppState {
    pub fn new(registry: Arc<JobRegistry>, provider: Arc<dyn EnrichmentProvider>) -> Self {
        Self {
            verifier: Arc::new(VerificationService::new(registry.clone(), provider)),
            correlator: Arc::new(CallbackCorrelator::new(registry.clone())),
            registry,
        }
    }
}
