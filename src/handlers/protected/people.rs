// handlers/protected/people.rs - /people and /people/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::database::models::{CreatePerson, PersonRecord, UpdatePerson};
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<PersonRecord>> {
    Ok(ApiResponse::success(state.db.people().list().await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PersonRecord> {
    Ok(ApiResponse::success(state.db.people().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreatePerson>, JsonRejection>,
) -> ApiResult<PersonRecord> {
    let Json(payload) = payload?;
    let person = state.db.people().create(payload).await?;
    Ok(ApiResponse::created(person))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePerson>, JsonRejection>,
) -> ApiResult<PersonRecord> {
    let Json(payload) = payload?;
    let person = state.db.people().update(&id, payload).await?;
    Ok(ApiResponse::success(person))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.db.people().delete(&id).await?;
    Ok(Message::deleted("Person"))
}
