//! Word progress storage and the collaborator contracts review sessions rely on.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use vocab_core::{select_due_items, ReviewSubmission, WordProgress};

/// Errors surfaced by storage adapters.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("word not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the candidate pool a review session samples from.
#[async_trait]
pub trait DueItemSource: Send + Sync {
    /// Word progress records due at `now`.
    async fn fetch_due_word_progress(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError>;
}

/// Receives the outcome of each rated word.
#[async_trait]
pub trait ReviewSink: Send + Sync {
    /// Store the updated progress carried by `submission`.
    async fn submit_review(&self, submission: &ReviewSubmission) -> Result<(), StoreError>;
}

/// In-memory word progress store keyed by word id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    words: RwLock<HashMap<String, WordProgress>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored words, ordered by id.
    pub async fn list_words(&self) -> Vec<WordProgress> {
        let words = self.words.read().await;
        let mut list: Vec<_> = words.values().cloned().collect();
        list.sort_by(|a, b| a.word_id.cmp(&b.word_id));
        list
    }

    pub async fn get_word(&self, word_id: &str) -> Result<WordProgress, StoreError> {
        self.words
            .read()
            .await
            .get(word_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(word_id.to_string()))
    }

    /// Insert or replace a word's progress.
    pub async fn upsert_word(&self, progress: WordProgress) {
        self.words
            .write()
            .await
            .insert(progress.word_id.clone(), progress);
    }

    /// Return the stored progress, creating fresh progress when missing.
    /// The flag is true when the word was created.
    pub async fn ensure_word(&self, word_id: &str) -> (WordProgress, bool) {
        self.ensure_word_with(word_id, |id: &str| WordProgress::new(id)).await
    }

    /// Like [`ensure_word`](Self::ensure_word), with `initial` building the new record.
    pub async fn ensure_word_with<F>(&self, word_id: &str, initial: F) -> (WordProgress, bool)
    where
        F: FnOnce(&str) -> WordProgress,
    {
        let mut words = self.words.write().await;
        if let Some(existing) = words.get(word_id) {
            return (existing.clone(), false);
        }
        let progress = initial(word_id);
        words.insert(word_id.to_string(), progress.clone());
        (progress, true)
    }
}

#[async_trait]
impl DueItemSource for MemoryStore {
    async fn fetch_due_word_progress(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError> {
        let words = self.list_words().await;
        Ok(select_due_items(&words, now).into_iter().cloned().collect())
    }
}

#[async_trait]
impl ReviewSink for MemoryStore {
    async fn submit_review(&self, submission: &ReviewSubmission) -> Result<(), StoreError> {
        let mut words = self.words.write().await;

        // Timestamp ordering: a review older than the stored one never overwrites it.
        if let Some(last) = words
            .get(&submission.word_id)
            .and_then(WordProgress::last_reviewed_at)
        {
            if last > submission.history_item.date {
                tracing::debug!(word_id = %submission.word_id, "ignoring stale review");
                return Ok(());
            }
        }

        words.insert(submission.word_id.clone(), submission.progress.clone());
        Ok(())
    }
}
