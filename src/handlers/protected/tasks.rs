// handlers/protected/tasks.rs - /tasks, /tasks/:id and /tasks/:id/toggle

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::database::models::{CreateTask, TaskFilter, TaskRecord, UpdateTask};
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

/// `?status=PENDING|COMPLETED` narrows the list; any other status is a 400
pub async fn list(
    State(state): State<AppState>,
    filter: Result<Query<TaskFilter>, QueryRejection>,
) -> ApiResult<Vec<TaskRecord>> {
    let Query(filter) = filter?;
    Ok(ApiResponse::success(state.db.tasks().list(filter).await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TaskRecord> {
    Ok(ApiResponse::success(state.db.tasks().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<TaskRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::created(state.db.tasks().create(payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<TaskRecord> {
    let Json(payload) = payload?;
    Ok(ApiResponse::success(state.db.tasks().update(&id, payload).await?))
}

pub async fn toggle(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TaskRecord> {
    Ok(ApiResponse::success(state.db.tasks().toggle_status(&id).await?))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.db.tasks().delete(&id).await?;
    Ok(Message::deleted("Task"))
}
