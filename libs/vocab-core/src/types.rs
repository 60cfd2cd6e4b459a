//! Core types for vocabulary review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::Schedule;
use crate::error::SchedulerError;

/// Easiness factor given to a word that has never been reviewed (2.50).
pub const INITIAL_EASINESS_FACTOR: u32 = 250;

/// Self-rated recall quality for one review, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(5);

    /// Create a quality rating, rejecting anything outside 0..=5.
    pub fn new(value: i64) -> Result<Self, SchedulerError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX.0 => Ok(Self(v)),
            _ => Err(SchedulerError::InvalidRating(value)),
        }
    }

    /// Numeric value (0-5).
    pub fn value(self) -> u8 {
        self.0
    }

    /// All six levels in ascending order.
    pub fn all() -> impl Iterator<Item = Quality> {
        (Self::MIN.0..=Self::MAX.0).map(Quality)
    }

    /// Fixed label shown next to the rating button.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "Didn't know",
            1 => "Wrong, but familiar",
            2 => "Wrong, but close",
            3 => "Hard",
            4 => "Good",
            _ => "Perfect",
        }
    }

    /// Whether the review continues the repetition streak.
    pub fn is_success(self) -> bool {
        self.0 >= 3
    }

    /// Session statistics bucket for this rating.
    pub fn bucket(self) -> RatingBucket {
        match self.0 {
            4..=5 => RatingBucket::Remembered,
            2..=3 => RatingBucket::Learning,
            _ => RatingBucket::Struggled,
        }
    }
}

impl TryFrom<i64> for Quality {
    type Error = SchedulerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Outcome bucket a rating is counted under in session statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingBucket {
    Remembered,
    Learning,
    Struggled,
}

/// One entry of a word's review history.
///
/// This is the persisted shape: `date` as an ISO-8601 string, integer `quality`,
/// `interval` and `efFactor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewHistoryItem {
    pub date: DateTime<Utc>,
    pub quality: Quality,
    pub interval: u32,
    pub ef_factor: u32,
}

/// Scheduling state of a single vocabulary item.
///
/// Serialized in the same camelCase shape as its history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub word_id: String,
    pub repetition_level: u32,
    /// Hundredths of the real factor (250 = 2.50), never below 130.
    pub easiness_factor: u32,
    pub previous_interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_history: Vec<ReviewHistoryItem>,
}

impl WordProgress {
    /// Fresh progress for a word that has never been reviewed.
    pub fn new(word_id: impl Into<String>) -> Self {
        Self {
            word_id: word_id.into(),
            repetition_level: 0,
            easiness_factor: INITIAL_EASINESS_FACTOR,
            previous_interval: 0,
            next_review_date: None,
            review_history: Vec::new(),
        }
    }

    /// A word is due when it has no review date or the date has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date.map_or(true, |date| date <= now)
    }

    /// Time of the most recent review, if any.
    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.review_history.last().map(|item| item.date)
    }

    /// Progress after a review: the new schedule installed and the entry appended.
    pub fn apply_review(&self, schedule: &Schedule, entry: ReviewHistoryItem) -> Self {
        let mut review_history = self.review_history.clone();
        review_history.push(entry);

        Self {
            word_id: self.word_id.clone(),
            repetition_level: schedule.next_repetition_level,
            easiness_factor: schedule.next_easiness_factor,
            previous_interval: schedule.next_interval,
            next_review_date: Some(schedule.next_review_date),
            review_history,
        }
    }
}

impl AsRef<WordProgress> for WordProgress {
    fn as_ref(&self) -> &WordProgress {
        self
    }
}

/// Session sizing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Upper bound on the number of words drawn into one session.
    pub batch_cap: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self { batch_cap: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert_eq!(Quality::new(-1), Err(SchedulerError::InvalidRating(-1)));
        assert_eq!(Quality::new(6), Err(SchedulerError::InvalidRating(6)));
        assert_eq!(Quality::new(300), Err(SchedulerError::InvalidRating(300)));
        assert_eq!(Quality::new(5).unwrap().value(), 5);
    }

    #[test]
    fn bucket_boundaries() {
        let buckets: Vec<_> = Quality::all().map(Quality::bucket).collect();
        assert_eq!(
            buckets,
            vec![
                RatingBucket::Struggled,
                RatingBucket::Struggled,
                RatingBucket::Learning,
                RatingBucket::Learning,
                RatingBucket::Remembered,
                RatingBucket::Remembered,
            ]
        );
    }

    #[test]
    fn labels_cover_every_level() {
        assert_eq!(Quality::MIN.label(), "Didn't know");
        assert_eq!(Quality::MAX.label(), "Perfect");
        assert_eq!(Quality::all().count(), 6);
    }

    #[test]
    fn quality_deserializes_with_validation() {
        let q: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }

    #[test]
    fn history_item_uses_persisted_field_names() {
        let item = ReviewHistoryItem {
            date: now(),
            quality: Quality::new(3).unwrap(),
            interval: 6,
            ef_factor: 236,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["date"], "2024-03-01T09:00:00Z");
        assert_eq!(json["quality"], 3);
        assert_eq!(json["interval"], 6);
        assert_eq!(json["efFactor"], 236);
    }

    #[test]
    fn progress_uses_the_same_casing_as_history() {
        let progress = WordProgress {
            next_review_date: Some(now()),
            review_history: vec![ReviewHistoryItem {
                date: now(),
                quality: Quality::new(4).unwrap(),
                interval: 1,
                ef_factor: 250,
            }],
            ..WordProgress::new("w1")
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["wordId"], "w1");
        assert_eq!(json["repetitionLevel"], 0);
        assert_eq!(json["easinessFactor"], 250);
        assert_eq!(json["previousInterval"], 0);
        assert_eq!(json["nextReviewDate"], "2024-03-01T09:00:00Z");
        assert_eq!(json["reviewHistory"][0]["efFactor"], 250);

        let back: WordProgress = serde_json::from_value(json).unwrap();
        assert_eq!(back, progress);
    }

    #[test]
    fn unscheduled_word_is_due() {
        let progress = WordProgress::new("w1");
        assert!(progress.is_due(now()));
    }

    #[test]
    fn due_date_boundary_is_inclusive() {
        let mut progress = WordProgress::new("w1");
        progress.next_review_date = Some(now());
        assert!(progress.is_due(now()));
        progress.next_review_date = Some(now() + Duration::seconds(1));
        assert!(!progress.is_due(now()));
    }
}
