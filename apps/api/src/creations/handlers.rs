//! Axum route handlers for the creations API: dashboard listing, community
//! feed, and the like toggle.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::caller::Caller;
use crate::response::ApiEnvelope;
use crate::state::AppState;

/// GET /api/creations/mine
///
/// The caller's own creations, newest first.
pub async fn handle_mine(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let creations = state.store.for_user(&caller.user_id).await?;
    Ok(Json(ApiEnvelope::creations(creations)))
}

/// GET /api/creations/published
///
/// The community feed: published creations across all users, newest first.
pub async fn handle_published(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let creations = state.store.published().await?;
    Ok(Json(ApiEnvelope::creations(creations)))
}

/// POST /api/creations/:id/like
///
/// Flips the caller's membership in the creation's likes set.
pub async fn handle_toggle_like(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(creation_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope>, AppError> {
    match state.store.toggle_like(creation_id, &caller.user_id).await? {
        None => Ok(Json(ApiEnvelope::failure("Creation not found"))),
        Some(like) if like.liked => Ok(Json(ApiEnvelope::like_state(true, "Creation liked"))),
        Some(_) => Ok(Json(ApiEnvelope::like_state(false, "Like removed"))),
    }
}
