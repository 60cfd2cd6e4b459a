//! Spaced repetition scheduling.

pub mod sm2;

use crate::types::{Quality, ReviewHistoryItem, WordProgress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sm2::{compute_next_schedule, Sm2};

/// Scheduling state produced by one review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub next_repetition_level: u32,
    pub next_easiness_factor: u32,
    pub next_interval: u32,
    pub next_review_date: DateTime<Utc>,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next schedule for a word after it was rated.
    fn schedule(&self, progress: &WordProgress, quality: Quality, now: DateTime<Utc>) -> Schedule;

    /// Initial state for a word that has never been reviewed.
    fn initial_progress(&self, word_id: &str) -> WordProgress;
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn SpacedRepetitionAlgorithm>> {
    match name {
        "sm2" => Some(Box::new(Sm2::default())),
        _ => None,
    }
}

/// Build the history entry recorded for a review made at `now`.
pub fn create_review_history_item(
    quality: Quality,
    interval: u32,
    ef_factor: u32,
    now: DateTime<Utc>,
) -> ReviewHistoryItem {
    ReviewHistoryItem {
        date: now,
        quality,
        interval,
        ef_factor,
    }
}

/// Keep the items that are due at `now`, in their original order.
pub fn select_due_items<T: AsRef<WordProgress>>(items: &[T], now: DateTime<Utc>) -> Vec<&T> {
    items.iter().filter(|item| item.as_ref().is_due(now)).collect()
}
