//! Word progress endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use vocab_core::summarize_progress;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/words
pub async fn list(State(state): State<AppState>) -> Json<WordListResponse> {
    Json(WordListResponse {
        words: state.store.list_words().await,
    })
}

/// PUT /api/words/:word_id
/// Registers a word for review with the algorithm's initial progress; existing
/// progress is kept.
pub async fn upsert(
    State(state): State<AppState>,
    Path(word_id): Path<String>,
) -> Result<Json<UpsertWordResponse>> {
    let word_id = word_id.trim();
    if word_id.is_empty() {
        return Err(crate::error::ApiError::BadRequest(
            "word id must not be empty".to_string(),
        ));
    }

    let (word, created) = state
        .store
        .ensure_word_with(word_id, |id| state.review.algorithm().initial_progress(id))
        .await;
    if created {
        tracing::info!("Registered word: {}", word_id);
        state.review.invalidate_due_items().await;
    }

    Ok(Json(UpsertWordResponse { word, created }))
}

/// GET /api/words/:word_id/insight
pub async fn insight(
    State(state): State<AppState>,
    Path(word_id): Path<String>,
) -> Result<Json<ProgressInsight>> {
    let progress = state.store.get_word(&word_id).await?;
    Ok(Json(summarize_progress(&progress, Utc::now())))
}
