//! Review session controller.
//!
//! A session samples a batch from the candidate pool and walks the learner
//! through it one word at a time: show the front, flip, rate, advance. Each
//! command replaces the [`SessionState`] value and returns the effects the
//! caller must carry out (persisting a review, invalidating cached due items).
//! The controller itself performs no I/O.

mod batch;
mod state;

pub use batch::SessionBatch;
pub use state::{
    SessionPhase, SessionState, SessionStats, SessionStatus, SessionSummary, SessionView,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::algorithm::{create_review_history_item, SpacedRepetitionAlgorithm, Sm2};
use crate::error::{Result, SessionError};
use crate::types::{Quality, ReviewHistoryItem, ReviewSettings, WordProgress};

/// User actions that drive a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Sample a batch from the candidate pool and show the first word.
    Start(Vec<WordProgress>),
    /// Reveal the answer and the rating options.
    Flip,
    /// Highlight a rating without committing it.
    Select(Quality),
    /// Commit a rating for the current word and advance.
    Rate(Quality),
    /// Throw away the current batch and stats and sample again.
    Restart(Vec<WordProgress>),
}

/// Updated progress for one rated word, to be handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub word_id: String,
    pub quality: Quality,
    pub history_item: ReviewHistoryItem,
    pub progress: WordProgress,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    SubmitReview(ReviewSubmission),
    InvalidateDueItems,
    Completed(SessionSummary),
}

/// Interactive review session over a randomly sampled batch.
pub struct ReviewSession<R> {
    settings: ReviewSettings,
    algorithm: Arc<dyn SpacedRepetitionAlgorithm>,
    rng: R,
    batch: SessionBatch,
    state: SessionState,
}

impl<R: Rng> ReviewSession<R> {
    /// Idle session using SM-2 and the given random source for sampling.
    pub fn new(settings: ReviewSettings, rng: R) -> Self {
        Self {
            settings,
            algorithm: Arc::new(Sm2::default()),
            rng,
            batch: SessionBatch::default(),
            state: SessionState::idle(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Arc<dyn SpacedRepetitionAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn batch(&self) -> &SessionBatch {
        &self.batch
    }

    pub fn current_item(&self) -> Option<&WordProgress> {
        self.state.current_index().and_then(|index| self.batch.get(index))
    }

    /// Final outcome, once the session has completed.
    pub fn summary(&self) -> Option<SessionSummary> {
        self.state
            .is_completed()
            .then(|| SessionSummary::from_stats(self.state.stats))
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> SessionView {
        let index = match self.state.phase {
            SessionPhase::Presenting { index, .. } => index,
            SessionPhase::Completed => self.batch.len(),
            SessionPhase::Idle | SessionPhase::Empty => 0,
        };

        SessionView {
            status: self.state.phase.status(),
            current_item: self.current_item().cloned(),
            index,
            total: self.batch.len(),
            flipped: self.state.flipped(),
            selected_rating: self.state.selected_rating,
            stats: self.state.stats,
            summary: self.summary(),
        }
    }

    /// Apply a command. On error the state is left untouched.
    pub fn dispatch(&mut self, command: SessionCommand, now: DateTime<Utc>) -> Result<Vec<SessionEffect>> {
        match command {
            SessionCommand::Start(pool) => {
                if self.state.phase != SessionPhase::Idle {
                    return Err(SessionError::AlreadyStarted);
                }
                self.begin(&pool);
                Ok(Vec::new())
            }
            SessionCommand::Restart(pool) => {
                self.begin(&pool);
                Ok(Vec::new())
            }
            SessionCommand::Flip => {
                let (index, _) = self.presenting()?;
                self.state = SessionState {
                    phase: SessionPhase::Presenting {
                        index,
                        flipped: true,
                    },
                    ..self.state.clone()
                };
                Ok(Vec::new())
            }
            SessionCommand::Select(quality) => {
                let (_, flipped) = self.presenting()?;
                if !flipped {
                    return Err(SessionError::NotFlipped);
                }
                self.state = SessionState {
                    selected_rating: Some(quality),
                    ..self.state.clone()
                };
                Ok(Vec::new())
            }
            SessionCommand::Rate(quality) => self.rate(quality, now),
        }
    }

    fn begin(&mut self, pool: &[WordProgress]) {
        self.batch = SessionBatch::sample(pool, self.settings.batch_cap, &mut self.rng);
        let phase = if self.batch.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Presenting {
                index: 0,
                flipped: false,
            }
        };
        self.state = SessionState {
            phase,
            ..SessionState::idle()
        };

        tracing::debug!(
            pool = pool.len(),
            batch = self.batch.len(),
            "review session started"
        );
    }

    /// Position of the word on screen, or the reason there is none.
    fn presenting(&self) -> Result<(usize, bool)> {
        match self.state.phase {
            SessionPhase::Idle => Err(SessionError::NotStarted),
            SessionPhase::Empty => Err(SessionError::EmptyPool),
            SessionPhase::Completed => Err(SessionError::Completed),
            SessionPhase::Presenting { index, flipped } => {
                if index >= self.batch.len() {
                    return Err(SessionError::OutOfBounds {
                        index,
                        len: self.batch.len(),
                    });
                }
                Ok((index, flipped))
            }
        }
    }

    fn rate(&mut self, quality: Quality, now: DateTime<Utc>) -> Result<Vec<SessionEffect>> {
        let (index, flipped) = self.presenting()?;
        if !flipped {
            return Err(SessionError::NotFlipped);
        }
        let word = self.batch.get(index).ok_or(SessionError::OutOfBounds {
            index,
            len: self.batch.len(),
        })?;

        let stats = self.state.stats.record(quality.bucket());

        let schedule = self.algorithm.schedule(word, quality, now);
        let history_item = create_review_history_item(
            quality,
            schedule.next_interval,
            schedule.next_easiness_factor,
            now,
        );
        let progress = word.apply_review(&schedule, history_item.clone());

        tracing::debug!(
            word_id = %word.word_id,
            quality = quality.value(),
            interval = schedule.next_interval,
            ease = schedule.next_easiness_factor,
            "word rated"
        );

        let mut effects = vec![SessionEffect::SubmitReview(ReviewSubmission {
            word_id: word.word_id.clone(),
            quality,
            history_item,
            progress,
        })];

        let is_last = index + 1 >= self.batch.len();
        let phase = if is_last {
            SessionPhase::Completed
        } else {
            SessionPhase::Presenting {
                index: index + 1,
                flipped: false,
            }
        };
        self.state = SessionState {
            phase,
            selected_rating: None,
            stats,
        };

        if is_last {
            let summary = SessionSummary::from_stats(stats);
            tracing::info!(
                remembered = stats.remembered,
                learning = stats.learning,
                struggled = stats.struggled,
                "review session completed"
            );
            effects.push(SessionEffect::InvalidateDueItems);
            effects.push(SessionEffect::Completed(summary));
        }

        Ok(effects)
    }
}
