//! Test helper utilities: a scripted enrichment provider and router plumbing

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

use decision_maker_verify::{
    app_state::AppState,
    models::job::{CorrelationId, VerificationKey},
    registry::JobRegistry,
    routes,
    services::enrichment::{EnrichmentProvider, SubmissionError},
};

/// Holds a submission after the provider has issued its id but before the
/// id is handed back, so a callback can be delivered in between.
#[derive(Default)]
pub struct SubmissionGate {
    pub issued: Notify,
    pub release: Notify,
}

/// Stands in for the enrichment provider. Issues a fresh UUID per submission
/// and remembers which key each id was issued for.
#[derive(Default)]
pub struct FakeProvider {
    issued: Mutex<Vec<(VerificationKey, CorrelationId)>>,
    reject: AtomicBool,
    hang_next: AtomicBool,
    delay: Option<Duration>,
    gate: Option<Arc<SubmissionGate>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Provider that takes `delay` to answer, widening the window in which
    /// duplicate requests and early callbacks can race the submission.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn gated() -> (Arc<Self>, Arc<SubmissionGate>) {
        let gate = Arc::new(SubmissionGate::default());
        let provider = Arc::new(Self {
            gate: Some(gate.clone()),
            ..Self::default()
        });
        (provider, gate)
    }

    /// The next submission never returns.
    pub fn hang_next_call(&self) {
        self.hang_next.store(true, Ordering::SeqCst);
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.issued.lock().len()
    }

    pub fn calls_for(&self, email: &str) -> usize {
        let key = VerificationKey::parse(email).unwrap();
        self.issued.lock().iter().filter(|(k, _)| *k == key).count()
    }

    /// Most recent correlation id issued for `email`.
    pub fn correlation_for(&self, email: &str) -> CorrelationId {
        let key = VerificationKey::parse(email).unwrap();
        self.issued
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, id)| id.clone())
            .unwrap_or_else(|| panic!("no submission recorded for {email}"))
    }
}

#[async_trait]
impl EnrichmentProvider for FakeProvider {
    async fn submit(&self, key: &VerificationKey) -> Result<CorrelationId, SubmissionError> {
        if self.hang_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(SubmissionError::Rejected {
                status: 503,
                detail: "provider unavailable".to_string(),
            });
        }
        let id = CorrelationId::new(Uuid::new_v4().to_string());
        self.issued.lock().push((key.clone(), id.clone()));
        if let Some(gate) = &self.gate {
            gate.issued.notify_one();
            gate.release.notified().await;
        }
        Ok(id)
    }
}

/// Fresh registry + state wired to `provider`.
pub fn test_state(provider: Arc<FakeProvider>) -> (AppState, Arc<JobRegistry>) {
    let registry = Arc::new(JobRegistry::default());
    (AppState::new(registry.clone(), provider), registry)
}

pub fn test_app(provider: Arc<FakeProvider>) -> (Router, Arc<JobRegistry>) {
    let (state, registry) = test_state(provider);
    (routes::api_router(state), registry)
}

/// Send one request through the router and decode the body as JSON when it is
/// JSON, or as a JSON string otherwise.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub async fn verify(app: &Router, email: &str) -> (StatusCode, Value) {
    send(app, post_json("/verify", &serde_json::json!({ "email": email }))).await
}

pub async fn status(app: &Router, email: &str) -> Value {
    let (code, body) = send(app, get(&format!("/status?email={email}"))).await;
    assert_eq!(code, StatusCode::OK);
    body
}

pub async fn deliver(app: &Router, body: &Value) {
    let (code, ack) = send(app, post_json("/api/enrich/webhook", body)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(ack, Value::String("OK".to_string()));
}
