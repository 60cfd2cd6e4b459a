//! API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export shared types from vocab-core
pub use vocab_core::{ProgressInsight, Quality, SessionView, WordProgress};

// === Review Types ===

/// One of the six rating choices offered after a flip.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatingOption {
    pub quality: Quality,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueItemsResponse {
    pub items: Vec<WordProgress>,
    pub total: usize,
    pub study_limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingRequest {
    pub quality: i64,
}

/// A review submission that could not be saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewNotification {
    pub word_id: String,
    pub message: String,
}

/// Session state returned by every session endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub view: SessionView,
    /// Write failures since the last read; each is reported once.
    pub notifications: Vec<ReviewNotification>,
}

// === Word Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct WordListResponse {
    pub words: Vec<WordProgress>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertWordResponse {
    pub word: WordProgress,
    pub created: bool,
}
