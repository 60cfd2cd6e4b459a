//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with configurable parameters. Easiness factors and
//! intervals are kept in integer space: the factor in hundredths, intervals in
//! whole days.

use super::{Schedule, SpacedRepetitionAlgorithm};
use crate::types::{Quality, WordProgress, INITIAL_EASINESS_FACTOR};
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: u32,
    pub minimum_ease: u32,
    pub maximum_interval: u32,
    pub first_interval: u32,
    pub second_interval: u32,
    pub failure_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASINESS_FACTOR,
            minimum_ease: 130,
            maximum_interval: 365,
            first_interval: 1,
            second_interval: 3,
            failure_interval: 1,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_progress(&self, word_id: &str) -> WordProgress {
        WordProgress {
            easiness_factor: self.initial_ease,
            ..WordProgress::new(word_id)
        }
    }

    fn schedule(&self, progress: &WordProgress, quality: Quality, now: DateTime<Utc>) -> Schedule {
        self.next_schedule(
            quality,
            progress.repetition_level,
            progress.easiness_factor,
            progress.previous_interval,
            now,
        )
    }
}

impl Sm2 {
    /// Compute the schedule that follows a review rated `quality`.
    pub fn next_schedule(
        &self,
        quality: Quality,
        repetition_level: u32,
        easiness_factor: u32,
        previous_interval: u32,
        now: DateTime<Utc>,
    ) -> Schedule {
        // EF is updated on every review, streak or not.
        let next_easiness_factor = self.next_ease(quality, easiness_factor);

        let (next_repetition_level, next_interval) = if quality.is_success() {
            let level = repetition_level.saturating_add(1);
            let interval = match level {
                1 => self.first_interval,
                2 => self.second_interval,
                _ => self.grow_interval(previous_interval, next_easiness_factor),
            };
            (level, interval)
        } else {
            (0, self.failure_interval)
        };

        Schedule {
            next_repetition_level,
            next_easiness_factor,
            next_interval,
            next_review_date: review_date(now, next_interval),
        }
    }

    /// EF' = EF + (0.1 - d * (0.08 + d * 0.02)) with d = 5 - q, in hundredths.
    fn next_ease(&self, quality: Quality, easiness_factor: u32) -> u32 {
        let d = i64::from(5 - quality.value());
        let delta = 10 - d * (8 + 2 * d);
        let next = i64::from(easiness_factor) + delta;
        u32::try_from(next.max(i64::from(self.minimum_ease))).unwrap_or(self.minimum_ease)
    }

    fn grow_interval(&self, previous_interval: u32, easiness_factor: u32) -> u32 {
        let scaled = (u64::from(previous_interval) * u64::from(easiness_factor) + 50) / 100;
        let capped = scaled.min(u64::from(self.maximum_interval)) as u32;
        // Growth phase intervals must strictly increase, even past the cap.
        // Saturates at u32::MAX, the one point where no larger interval exists.
        if capped <= previous_interval {
            previous_interval.saturating_add(1)
        } else {
            capped
        }
    }
}

/// `now` plus `interval` days, pinned to the latest representable time on overflow.
fn review_date(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(interval))
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Compute the next schedule with the default SM-2 parameters.
pub fn compute_next_schedule(
    quality: Quality,
    repetition_level: u32,
    easiness_factor: u32,
    previous_interval: u32,
    now: DateTime<Utc>,
) -> Schedule {
    Sm2::default().next_schedule(quality, repetition_level, easiness_factor, previous_interval, now)
}
