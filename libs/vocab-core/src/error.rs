//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("invalid rating {0}: quality must be between 0 and 5")]
    InvalidRating(i64),
}

/// Errors raised when a command does not fit the current session phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("session has not been started")]
    NotStarted,

    #[error("session already started")]
    AlreadyStarted,

    #[error("card must be flipped before it can be rated")]
    NotFlipped,

    #[error("index {index} is out of bounds for a batch of {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("session already completed")]
    Completed,

    #[error("no items available for review")]
    EmptyPool,
}
