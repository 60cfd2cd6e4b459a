//! Review session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vocab_core::SessionCommand;

use crate::error::Result;
use crate::models::*;
use crate::services::review::SessionSnapshot;
use crate::AppState;

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            view: snapshot.view,
            notifications: snapshot.notifications,
        }
    }
}

/// GET /api/review/ratings
pub async fn ratings() -> Json<Vec<RatingOption>> {
    Json(
        Quality::all()
            .map(|quality| RatingOption {
                quality,
                label: quality.label().to_string(),
            })
            .collect(),
    )
}

/// GET /api/review/due
pub async fn due(State(state): State<AppState>) -> Result<Json<DueItemsResponse>> {
    let due = state.review.due_items(Utc::now()).await?;
    Ok(Json(DueItemsResponse {
        total: due.items.len(),
        study_limit: due.study_limit,
        items: due.items,
    }))
}

/// POST /api/review/sessions
pub async fn start(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let snapshot = state.review.start_session(Utc::now()).await?;
    Ok(Json(snapshot.into()))
}

/// GET /api/review/sessions/:id
pub async fn show(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let snapshot = state.review.snapshot(session_id).await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/review/sessions/:id/flip
pub async fn flip(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let snapshot = state
        .review
        .command(session_id, SessionCommand::Flip, Utc::now())
        .await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/review/sessions/:id/select
pub async fn select(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<RatingRequest>,
) -> Result<Json<SessionResponse>> {
    let quality = Quality::new(payload.quality)?;
    let snapshot = state
        .review
        .command(session_id, SessionCommand::Select(quality), Utc::now())
        .await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/review/sessions/:id/rate
/// Advances immediately; the review is saved in the background.
pub async fn rate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<RatingRequest>,
) -> Result<Json<SessionResponse>> {
    let quality = Quality::new(payload.quality)?;
    let snapshot = state
        .review
        .command(session_id, SessionCommand::Rate(quality), Utc::now())
        .await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/review/sessions/:id/restart
pub async fn restart(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let snapshot = state.review.restart(session_id, Utc::now()).await?;
    Ok(Json(snapshot.into()))
}

/// DELETE /api/review/sessions/:id
pub async fn dismiss(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.review.dismiss(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
