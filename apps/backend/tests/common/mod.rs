//! Common test utilities and fixtures for integration tests.
//!
//! Tests run against the in-memory store, so no external services are needed.

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use vocab_core::{ReviewSettings, ReviewSubmission, SpacedRepetitionAlgorithm, WordProgress};
use vocab_review_backend::db::{MemoryStore, ReviewSink, StoreError};
use vocab_review_backend::{router, AppState};

/// Test context holding the store and the router built over it.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    app: Router,
}

impl TestContext {
    /// Create a context whose reviews are written to the store.
    pub fn new() -> Self {
        Self::with_settings(ReviewSettings::default())
    }

    /// Create a context with custom session sizing.
    pub fn with_settings(settings: ReviewSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = router(AppState::new(store.clone(), settings));
        Self { store, app }
    }

    /// Create a context that schedules with `algorithm`.
    pub fn with_algorithm(algorithm: Arc<dyn SpacedRepetitionAlgorithm>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = router(AppState::with_algorithm(
            store.clone(),
            ReviewSettings::default(),
            algorithm,
        ));
        Self { store, app }
    }

    /// Create a context whose review writes always fail.
    pub fn with_failing_sink() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_sink(store.clone(), Arc::new(FailingSink), ReviewSettings::default());
        Self {
            store,
            app: router(state),
        }
    }

    /// Get a test server for the router.
    pub fn server(&self) -> TestServer {
        TestServer::new(self.app.clone()).unwrap()
    }

    /// Seed the store with `count` fresh words named word-0, word-1, ...
    pub async fn seed_words(&self, count: usize) {
        for i in 0..count {
            self.store.ensure_word(&format!("word-{}", i)).await;
        }
    }

    /// Seed the store with a word scheduled in the future.
    pub async fn seed_scheduled_word(&self, word_id: &str, days_ahead: i64) {
        self.store
            .upsert_word(fixtures::scheduled_progress(word_id, days_ahead))
            .await;
    }

    /// Poll the store until `word_id` has `reviews` history entries.
    pub async fn wait_for_reviews(&self, word_id: &str, reviews: usize) -> Option<WordProgress> {
        for _ in 0..50 {
            if let Ok(progress) = self.store.get_word(word_id).await {
                if progress.review_history.len() >= reviews {
                    return Some(progress);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

/// Start a session and return its id and response body.
pub async fn start_session(server: &TestServer) -> (String, Value) {
    let response = server.post("/api/review/sessions").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let id = body["session_id"].as_str().unwrap().to_string();
    (id, body)
}

/// Flip the current card and rate it.
pub async fn flip_and_rate(server: &TestServer, session_id: &str, quality: i64) -> Value {
    server
        .post(&format!("/api/review/sessions/{}/flip", session_id))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/review/sessions/{}/rate", session_id))
        .json(&fixtures::rating_request(quality))
        .await;
    response.assert_status_ok();
    response.json()
}

struct FailingSink;

#[async_trait]
impl ReviewSink for FailingSink {
    async fn submit_review(&self, _submission: &ReviewSubmission) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write timed out".to_string()))
    }
}
