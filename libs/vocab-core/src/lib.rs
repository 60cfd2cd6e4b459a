//! Core vocabulary review library.
//!
//! Provides:
//! - SM-2 scheduling in integer hundredths (next interval, ease, review date)
//! - Due-item selection and display estimators (retention, mastery)
//! - The review session controller: a command-driven state machine that
//!   returns persistence effects instead of performing them
//! - Shared types (WordProgress, Quality, ReviewHistoryItem, etc.)

pub mod algorithm;
pub mod error;
pub mod estimate;
pub mod session;
pub mod types;

pub use algorithm::{
    compute_next_schedule, create_review_history_item, get_algorithm, select_due_items, Schedule,
    Sm2, SpacedRepetitionAlgorithm,
};
pub use error::{Result, SchedulerError, SessionError};
pub use estimate::{
    calculate_average_quality, calculate_mastery_level, estimate_retention,
    get_optimal_study_limit, summarize_progress, ProgressInsight,
};
pub use session::{
    ReviewSession, ReviewSubmission, SessionBatch, SessionCommand, SessionEffect, SessionPhase,
    SessionState, SessionStats, SessionStatus, SessionSummary, SessionView,
};
pub use types::{Quality, RatingBucket, ReviewHistoryItem, ReviewSettings, WordProgress};
