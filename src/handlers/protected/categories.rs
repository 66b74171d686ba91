// handlers/protected/categories.rs - /categories and /categories/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::database::models::{CategoryInput, CategoryRecord};
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<CategoryRecord>> {
    Ok(ApiResponse::success(state.db.categories().list().await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CategoryRecord> {
    Ok(ApiResponse::success(state.db.categories().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult<CategoryRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::created(state.db.categories().create(payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult<CategoryRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::success(
        state.db.categories().update(&id, payload).await?,
    ))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.db.categories().delete(&id).await?;
    Ok(Message::deleted("Category"))
}
