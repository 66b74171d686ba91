// handlers/protected/tags.rs - /tags and /tags/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::database::models::{TagInput, TagRecord};
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<TagRecord>> {
    Ok(ApiResponse::success(state.db.tags().list().await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TagRecord> {
    Ok(ApiResponse::success(state.db.tags().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<TagInput>, JsonRejection>,
) -> ApiResult<TagRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::created(state.db.tags().create(payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TagInput>, JsonRejection>,
) -> ApiResult<TagRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::success(state.db.tags().update(&id, payload).await?))
}

/// Also unlinks the tag from every business and person
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.db.tags().delete(&id).await?;
    Ok(Message::deleted("Tag"))
}
