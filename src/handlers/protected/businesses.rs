// handlers/protected/businesses.rs - /businesses and /businesses/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::database::models::{BusinessRecord, CreateBusiness, UpdateBusiness};
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<BusinessRecord>> {
    let businesses = state.db.businesses().list().await?;
    Ok(ApiResponse::success(businesses))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BusinessRecord> {
    let business = state.db.businesses().get(&id).await?;
    Ok(ApiResponse::success(business))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateBusiness>, JsonRejection>,
) -> ApiResult<BusinessRecord> {
    let Json(payload) = payload?;
    let business = state.db.businesses().create(payload).await?;
    Ok(ApiResponse::created(business))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBusiness>, JsonRejection>,
) -> ApiResult<BusinessRecord> {
    let Json(payload) = payload?;
    let business = state.db.businesses().update(&id, payload).await?;
    Ok(ApiResponse::success(business))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.db.businesses().delete(&id).await?;
    Ok(Message::deleted("Business"))
}
