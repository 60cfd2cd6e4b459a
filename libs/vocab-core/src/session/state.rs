//! Session state values.

use serde::{Deserialize, Serialize};

use crate::types::{Quality, RatingBucket, WordProgress};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    /// Started on an empty candidate pool.
    Empty,
    Presenting { index: usize, flipped: bool },
    Completed,
}

/// Coarse status reported to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Empty,
    Presenting,
    Completed,
}

impl SessionPhase {
    pub fn status(self) -> SessionStatus {
        match self {
            Self::Idle => SessionStatus::Idle,
            Self::Empty => SessionStatus::Empty,
            Self::Presenting { .. } => SessionStatus::Presenting,
            Self::Completed => SessionStatus::Completed,
        }
    }
}

/// Ratings collected so far, by bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub remembered: usize,
    pub learning: usize,
    pub struggled: usize,
}

impl SessionStats {
    /// Stats with one more rating counted under `bucket`.
    pub fn record(self, bucket: RatingBucket) -> Self {
        match bucket {
            RatingBucket::Remembered => Self {
                remembered: self.remembered + 1,
                ..self
            },
            RatingBucket::Learning => Self {
                learning: self.learning + 1,
                ..self
            },
            RatingBucket::Struggled => Self {
                struggled: self.struggled + 1,
                ..self
            },
        }
    }

    pub fn total(&self) -> usize {
        self.remembered + self.learning + self.struggled
    }

    /// Share of ratings counted as remembered, 0 when nothing was rated.
    pub fn remembered_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.remembered as f64 / total as f64,
        }
    }
}

/// Complete state of one session. Replaced as a whole on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub selected_rating: Option<Quality>,
    pub stats: SessionStats,
}

impl SessionState {
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            selected_rating: None,
            stats: SessionStats::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            SessionPhase::Presenting { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn flipped(&self) -> bool {
        matches!(self.phase, SessionPhase::Presenting { flipped: true, .. })
    }
}

/// Final outcome of a session that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub total: usize,
    pub remembered_ratio: f64,
}

impl SessionSummary {
    pub fn from_stats(stats: SessionStats) -> Self {
        Self {
            total: stats.total(),
            remembered_ratio: stats.remembered_ratio(),
            stats,
        }
    }
}

/// What the display needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<WordProgress>,
    pub index: usize,
    pub total: usize,
    pub flipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_rating: Option<Quality>,
    pub stats: SessionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}
