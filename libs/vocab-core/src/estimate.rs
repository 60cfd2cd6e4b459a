//! Display-only estimators derived from word progress.
//!
//! Nothing here feeds back into scheduling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ReviewHistoryItem, WordProgress};

/// Decay constant (in days) of the forgetting curve.
const RETENTION_DECAY_DAYS: f64 = 5.0;

/// Estimated retention (0-100) after `days_since_review`, following R = R0 * e^(-t/S).
pub fn estimate_retention(days_since_review: f64, initial_retention: f64) -> u8 {
    let retention = initial_retention * (-days_since_review / RETENTION_DECAY_DAYS).exp();
    if retention.is_nan() {
        return 0;
    }
    retention.clamp(0.0, 100.0).round() as u8
}

/// Mastery percentage (0-100) from streak length and average quality.
pub fn calculate_mastery_level(repetition_level: u32, average_quality: f64) -> u8 {
    let base = (f64::from(repetition_level) * 20.0).min(90.0);
    let quality_adjustment = ((average_quality - 2.5) * 5.0).max(0.0);
    (base + quality_adjustment).min(100.0).round() as u8
}

/// Mean quality across the history, 0 when there is none.
pub fn calculate_average_quality(history: &[ReviewHistoryItem]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let total: u32 = history.iter().map(|item| u32::from(item.quality.value())).sum();
    f64::from(total) / history.len() as f64
}

/// Number of words to study in one sitting.
pub fn get_optimal_study_limit(user_capacity: usize, total_due_items: usize) -> usize {
    user_capacity.min(total_due_items)
}

/// Summary of a word's learning state for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInsight {
    pub word_id: String,
    pub average_quality: f64,
    pub mastery: u8,
    /// Estimated retention since the last review; `None` before the first review.
    pub retention: Option<u8>,
    pub is_due: bool,
    /// Whole days until the next review, 0 when already due.
    pub days_until_due: i64,
    pub reviews: usize,
}

/// Build the display summary for `progress` at `now`.
pub fn summarize_progress(progress: &WordProgress, now: DateTime<Utc>) -> ProgressInsight {
    let average_quality = calculate_average_quality(&progress.review_history);

    let retention = progress.last_reviewed_at().map(|reviewed_at| {
        let elapsed_days = (now - reviewed_at).num_seconds() as f64 / 86_400.0;
        estimate_retention(elapsed_days.max(0.0), 100.0)
    });

    let days_until_due = progress
        .next_review_date
        .map_or(0, |date| (date - now).num_days().max(0));

    ProgressInsight {
        word_id: progress.word_id.clone(),
        average_quality,
        mastery: calculate_mastery_level(progress.repetition_level, average_quality),
        retention,
        is_due: progress.is_due(now),
        days_until_due,
        reviews: progress.review_history.len(),
    }
}
