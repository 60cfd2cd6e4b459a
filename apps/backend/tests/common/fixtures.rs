//! Test fixtures and factory functions for creating test data.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use vocab_core::WordProgress;

/// Progress for a word that is not due until `days_ahead` days from now.
pub fn scheduled_progress(word_id: &str, days_ahead: i64) -> WordProgress {
    WordProgress {
        repetition_level: 2,
        previous_interval: 3,
        next_review_date: Some(Utc::now() + Duration::days(days_ahead)),
        ..WordProgress::new(word_id)
    }
}

/// Create a rate/select request body.
pub fn rating_request(quality: i64) -> Value {
    json!({ "quality": quality })
}
