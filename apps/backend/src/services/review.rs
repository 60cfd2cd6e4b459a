//! Hosts review sessions and carries out the effects they request.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use vocab_core::{
    get_optimal_study_limit, select_due_items, ReviewSession, ReviewSettings, ReviewSubmission,
    SessionCommand, SessionEffect, SessionView, Sm2, SpacedRepetitionAlgorithm, WordProgress,
};

use crate::db::{DueItemSource, ReviewSink};
use crate::error::{ApiError, Result};
use crate::models::ReviewNotification;

/// How long a fetched due pool is served before the source is queried again.
const DUE_CACHE_TTL_SECS: i64 = 60;

type Notifications = Arc<Mutex<Vec<ReviewNotification>>>;

/// Progress of rated words whose write has not finished yet, by word id.
type PendingReviews = Arc<Mutex<HashMap<String, WordProgress>>>;

struct SessionEntry {
    session: ReviewSession<StdRng>,
    notifications: Notifications,
}

/// Due pool as last fetched from the source.
///
/// `generation` changes on every invalidation, so a fetch that raced an
/// invalidation is never stored.
#[derive(Default)]
struct DueCache {
    generation: u64,
    fetched: Option<(DateTime<Utc>, Vec<WordProgress>)>,
}

impl DueCache {
    fn fresh_items(&self, now: DateTime<Utc>) -> Option<Vec<WordProgress>> {
        let (fetched_at, items) = self.fetched.as_ref()?;
        let age = now.signed_duration_since(*fetched_at);
        (age >= Duration::zero() && age < Duration::seconds(DUE_CACHE_TTL_SECS))
            .then(|| items.clone())
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.fetched = None;
    }
}

/// Session state plus the write failures not yet shown to the learner.
#[derive(Debug)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub view: SessionView,
    pub notifications: Vec<ReviewNotification>,
}

/// Due items together with the recommended number to study.
#[derive(Debug)]
pub struct DueItems {
    pub items: Vec<WordProgress>,
    pub study_limit: usize,
}

/// Review session registry.
///
/// Each session is independent; the sink is the only shared resource. Review
/// submissions are spawned and never awaited by the command that produced them.
/// A failed submission is reported once through the session's notifications and
/// is not retried.
///
/// Until a submission finishes, the rated progress overlays whatever the source
/// returns, so a restart or due query never sees the word in its pre-review state.
pub struct ReviewService {
    source: Arc<dyn DueItemSource>,
    sink: Arc<dyn ReviewSink>,
    settings: ReviewSettings,
    algorithm: Arc<dyn SpacedRepetitionAlgorithm>,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    due_cache: Arc<RwLock<DueCache>>,
    pending: PendingReviews,
}

impl ReviewService {
    pub fn new(
        source: Arc<dyn DueItemSource>,
        sink: Arc<dyn ReviewSink>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            source,
            sink,
            settings,
            algorithm: Arc::new(Sm2::default()),
            sessions: Mutex::new(HashMap::new()),
            due_cache: Arc::default(),
            pending: Arc::default(),
        }
    }

    /// Schedule reviews with `algorithm` instead of default SM-2.
    pub fn with_algorithm(mut self, algorithm: Arc<dyn SpacedRepetitionAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn settings(&self) -> ReviewSettings {
        self.settings
    }

    pub fn algorithm(&self) -> &dyn SpacedRepetitionAlgorithm {
        self.algorithm.as_ref()
    }

    /// Due candidates at `now`.
    pub async fn due_items(&self, now: DateTime<Utc>) -> Result<DueItems> {
        let items = self.candidate_pool(now).await?;
        Ok(DueItems {
            study_limit: get_optimal_study_limit(self.settings.batch_cap, items.len()),
            items,
        })
    }

    /// Drop the cached due items so the next query hits the source.
    pub async fn invalidate_due_items(&self) {
        self.due_cache.write().await.invalidate();
    }

    /// Open a new session over the current due items.
    pub async fn start_session(&self, now: DateTime<Utc>) -> Result<SessionSnapshot> {
        let pool = self.candidate_pool(now).await?;

        let mut session = ReviewSession::new(self.settings, StdRng::from_os_rng())
            .with_algorithm(Arc::clone(&self.algorithm));
        session.dispatch(SessionCommand::Start(pool), now)?;

        let session_id = Uuid::new_v4();
        let view = session.view();
        tracing::info!(
            %session_id,
            total = view.total,
            algorithm = self.algorithm.name(),
            "Started review session"
        );

        self.sessions.lock().await.insert(
            session_id,
            SessionEntry {
                session,
                notifications: Arc::default(),
            },
        );

        Ok(SessionSnapshot {
            session_id,
            view,
            notifications: Vec::new(),
        })
    }

    /// Current state of a session, draining its pending notifications.
    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot> {
        let (view, notifications) = {
            let sessions = self.sessions.lock().await;
            let entry = sessions
                .get(&session_id)
                .ok_or_else(|| session_not_found(session_id))?;
            (entry.session.view(), entry.notifications.clone())
        };

        let drained = std::mem::take(&mut *notifications.lock().await);
        Ok(SessionSnapshot {
            session_id,
            view,
            notifications: drained,
        })
    }

    /// Apply a flip, select or rate command and run the resulting effects.
    pub async fn command(
        &self,
        session_id: Uuid,
        command: SessionCommand,
        now: DateTime<Utc>,
    ) -> Result<SessionSnapshot> {
        let (effects, notifications) = {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions
                .get_mut(&session_id)
                .ok_or_else(|| session_not_found(session_id))?;
            let effects = entry.session.dispatch(command, now)?;
            (effects, entry.notifications.clone())
        };

        self.run_effects(effects, notifications).await;
        self.snapshot(session_id).await
    }

    /// Resample a session from a freshly fetched due pool.
    pub async fn restart(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<SessionSnapshot> {
        if !self.sessions.lock().await.contains_key(&session_id) {
            return Err(session_not_found(session_id));
        }
        self.invalidate_due_items().await;
        let pool = self.candidate_pool(now).await?;
        self.command(session_id, SessionCommand::Restart(pool), now)
            .await
    }

    /// Discard a session.
    pub async fn dismiss(&self, session_id: Uuid) -> Result<()> {
        if self.sessions.lock().await.remove(&session_id).is_none() {
            return Err(session_not_found(session_id));
        }
        tracing::info!(%session_id, "Dismissed review session");
        Ok(())
    }

    async fn candidate_pool(&self, now: DateTime<Utc>) -> Result<Vec<WordProgress>> {
        // Read before the source: a write that lands after this point is
        // already visible to the fetch below.
        let pending = self.pending.lock().await.clone();

        let (cached, generation) = {
            let cache = self.due_cache.read().await;
            (cache.fresh_items(now), cache.generation)
        };

        let items = match cached {
            Some(items) => items,
            None => {
                let fetched = self.source.fetch_due_word_progress(now).await?;
                let mut cache = self.due_cache.write().await;
                if cache.generation == generation {
                    cache.fetched = Some((now, fetched.clone()));
                }
                fetched
            }
        };

        let merged: Vec<WordProgress> = items
            .into_iter()
            .map(|progress| pending.get(&progress.word_id).cloned().unwrap_or(progress))
            .collect();
        Ok(select_due_items(&merged, now).into_iter().cloned().collect())
    }

    async fn run_effects(&self, effects: Vec<SessionEffect>, notifications: Notifications) {
        for effect in effects {
            match effect {
                SessionEffect::SubmitReview(submission) => {
                    self.pending
                        .lock()
                        .await
                        .insert(submission.word_id.clone(), submission.progress.clone());
                    self.spawn_submission(submission, notifications.clone());
                }
                SessionEffect::InvalidateDueItems => self.invalidate_due_items().await,
                SessionEffect::Completed(summary) => {
                    tracing::info!(
                        total = summary.total,
                        remembered_ratio = summary.remembered_ratio,
                        "Review session completed"
                    );
                }
            }
        }
    }

    fn spawn_submission(&self, submission: ReviewSubmission, notifications: Notifications) {
        let sink = Arc::clone(&self.sink);
        let due_cache = Arc::clone(&self.due_cache);
        let pending = Arc::clone(&self.pending);

        tokio::spawn(async move {
            let result = sink.submit_review(&submission).await;

            // The store now holds either the new progress or, on failure, the old
            // one; both must be refetched before the overlay goes away.
            due_cache.write().await.invalidate();
            {
                let mut pending = pending.lock().await;
                // A later rating of the same word keeps its own overlay.
                let superseded = pending.get(&submission.word_id).map_or(true, |progress| {
                    progress.last_reviewed_at() != Some(submission.history_item.date)
                });
                if !superseded {
                    pending.remove(&submission.word_id);
                }
            }

            if let Err(e) = result {
                tracing::warn!(word_id = %submission.word_id, "Failed to save review: {}", e);
                notifications.lock().await.push(ReviewNotification {
                    word_id: submission.word_id.clone(),
                    message: format!("Review for {} was not saved: {}", submission.word_id, e),
                });
            }
        });
    }
}

fn session_not_found(session_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Session {}", session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use vocab_core::{Quality, SessionStatus};

    struct FailingSink;

    #[async_trait]
    impl ReviewSink for FailingSink {
        async fn submit_review(&self, _submission: &ReviewSubmission) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    /// Forwards reviews to the store, one per released permit.
    struct GatedSink {
        store: Arc<MemoryStore>,
        gate: Semaphore,
    }

    impl GatedSink {
        fn closed(store: Arc<MemoryStore>) -> Arc<Self> {
            Arc::new(Self {
                store,
                gate: Semaphore::new(0),
            })
        }
    }

    #[async_trait]
    impl ReviewSink for GatedSink {
        async fn submit_review(&self, submission: &ReviewSubmission) -> std::result::Result<(), StoreError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            permit.forget();
            self.store.submit_review(submission).await
        }
    }

    async fn wait_for_history(store: &MemoryStore, word_id: &str, reviews: usize) -> usize {
        let mut len = 0;
        for _ in 0..50 {
            len = store.get_word(word_id).await.unwrap().review_history.len();
            if len >= reviews {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        len
    }

    async fn store_with_words(count: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..count {
            store.ensure_word(&format!("word-{i}")).await;
        }
        store
    }

    fn service(store: Arc<MemoryStore>, sink: Arc<dyn ReviewSink>) -> ReviewService {
        ReviewService::new(store, sink, ReviewSettings::default())
    }

    async fn wait_for_notifications(
        service: &ReviewService,
        id: Uuid,
        mut seen: Vec<ReviewNotification>,
    ) -> Vec<ReviewNotification> {
        for _ in 0..50 {
            if !seen.is_empty() {
                return seen;
            }
            seen.extend(service.snapshot(id).await.unwrap().notifications);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        seen
    }

    #[tokio::test]
    async fn test_empty_store_starts_empty_session() {
        let store = store_with_words(0).await;
        let service = service(store.clone(), store);

        let snapshot = service.start_session(Utc::now()).await.unwrap();
        assert_eq!(snapshot.view.status, SessionStatus::Empty);
        assert_eq!(snapshot.view.stats.total(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_once_and_session_advances() {
        let store = store_with_words(2).await;
        let service = service(store.clone(), Arc::new(FailingSink));
        let now = Utc::now();
        let id = service.start_session(now).await.unwrap().session_id;

        service.command(id, SessionCommand::Flip, now).await.unwrap();
        let rated = service
            .command(id, SessionCommand::Rate(Quality::new(4).unwrap()), now)
            .await
            .unwrap();
        assert_eq!(rated.view.index, 1);

        let notifications = wait_for_notifications(&service, id, rated.notifications).await;
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("offline"));

        let again = service.snapshot(id).await.unwrap();
        assert!(again.notifications.is_empty());

        // The lost write leaves the word due again.
        let due = service.due_items(now).await.unwrap();
        assert!(due.items.iter().any(|p| p.word_id == notifications[0].word_id));

        // Nothing was stored; the word keeps its old schedule.
        let stored = store.get_word(&notifications[0].word_id).await.unwrap();
        assert!(stored.review_history.is_empty());
    }

    #[tokio::test]
    async fn test_completion_invalidates_due_cache() {
        let store = store_with_words(1).await;
        let service = service(store.clone(), store.clone());
        let now = Utc::now();

        let id = service.start_session(now).await.unwrap().session_id;
        store.ensure_word("late-arrival").await;
        assert_eq!(service.due_items(now).await.unwrap().items.len(), 1);

        service.command(id, SessionCommand::Flip, now).await.unwrap();
        service
            .command(id, SessionCommand::Rate(Quality::new(5).unwrap()), now)
            .await
            .unwrap();

        let due = service.due_items(now).await.unwrap();
        assert!(due.items.iter().any(|p| p.word_id == "late-arrival"));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = store_with_words(1).await;
        let service = service(store.clone(), store);

        let result = service.snapshot(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        let result = service.dismiss(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_restart_mid_session_excludes_words_rated_in_flight() {
        let store = store_with_words(2).await;
        let sink = GatedSink::closed(store.clone());
        let service = service(store.clone(), sink.clone());
        let now = Utc::now();
        let id = service.start_session(now).await.unwrap().session_id;

        let flipped = service.command(id, SessionCommand::Flip, now).await.unwrap();
        let first = flipped.view.current_item.unwrap().word_id;
        service
            .command(id, SessionCommand::Rate(Quality::new(5).unwrap()), now)
            .await
            .unwrap();

        // The first write has not landed yet.
        let restarted = service.restart(id, now).await.unwrap();
        assert_eq!(restarted.view.total, 1);
        let second = restarted.view.current_item.unwrap().word_id;
        assert_ne!(second, first);

        sink.gate.add_permits(2);
        assert_eq!(wait_for_history(&store, &first, 1).await, 1);

        service.command(id, SessionCommand::Flip, now).await.unwrap();
        service
            .command(id, SessionCommand::Rate(Quality::new(4).unwrap()), now)
            .await
            .unwrap();
        assert_eq!(wait_for_history(&store, &second, 1).await, 1);

        let again = service.restart(id, now).await.unwrap();
        assert_eq!(again.view.status, SessionStatus::Empty);
        assert_eq!(store.get_word(&first).await.unwrap().review_history.len(), 1);
        assert_eq!(store.get_word(&second).await.unwrap().review_history.len(), 1);
    }

    #[tokio::test]
    async fn test_restart_right_after_completion_sees_rated_word() {
        let store = store_with_words(1).await;
        let sink = GatedSink::closed(store.clone());
        let service = service(store.clone(), sink.clone());
        let now = Utc::now();
        let id = service.start_session(now).await.unwrap().session_id;

        service.command(id, SessionCommand::Flip, now).await.unwrap();
        let done = service
            .command(id, SessionCommand::Rate(Quality::new(5).unwrap()), now)
            .await
            .unwrap();
        assert_eq!(done.view.status, SessionStatus::Completed);

        let restarted = service.restart(id, now).await.unwrap();
        assert_eq!(restarted.view.status, SessionStatus::Empty);

        sink.gate.add_permits(1);
        assert_eq!(wait_for_history(&store, "word-0", 1).await, 1);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(service.due_items(now).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_due_cache_expires() {
        let store = store_with_words(0).await;
        let service = service(store.clone(), store.clone());
        let now = Utc::now();
        store
            .upsert_word(WordProgress {
                next_review_date: Some(now + chrono::Duration::seconds(30)),
                ..WordProgress::new("soon")
            })
            .await;

        assert!(service.due_items(now).await.unwrap().items.is_empty());
        let cached = service
            .due_items(now + chrono::Duration::seconds(40))
            .await
            .unwrap();
        assert!(cached.items.is_empty());

        let later = service
            .due_items(now + chrono::Duration::minutes(2))
            .await
            .unwrap();
        assert_eq!(later.items.len(), 1);
        assert_eq!(later.items[0].word_id, "soon");
    }

    #[tokio::test]
    async fn test_sessions_use_configured_algorithm() {
        let store = store_with_words(1).await;
        let slow_start = Sm2 {
            first_interval: 2,
            ..Sm2::default()
        };
        let service = service(store.clone(), store.clone()).with_algorithm(Arc::new(slow_start));
        assert_eq!(service.algorithm().name(), "sm2");

        let now = Utc::now();
        let id = service.start_session(now).await.unwrap().session_id;
        service.command(id, SessionCommand::Flip, now).await.unwrap();
        service
            .command(id, SessionCommand::Rate(Quality::new(5).unwrap()), now)
            .await
            .unwrap();

        assert_eq!(wait_for_history(&store, "word-0", 1).await, 1);
        let stored = store.get_word("word-0").await.unwrap();
        assert_eq!(stored.previous_interval, 2);
    }
}
