// src/handlers/user_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::{FreightError, FreightResult},
    models::{
        driver::{DriverResponse, DriverUpdate},
        user::{UserRegistration, UserResponse},
    },
    services::user_service::UserOperations,
    state::AppState,
};

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<UserRegistration>,
) -> FreightResult<(StatusCode, Json<UserResponse>)> {
    let user = state.user_service.register_user(registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> FreightResult<Json<UserResponse>> {
    state
        .user_service
        .get_user(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| FreightError::user_not_found(&user_id))
}

pub async fn list_drivers(State(state): State<Arc<AppState>>) -> FreightResult<Json<Vec<DriverResponse>>> {
    Ok(Json(state.user_service.list_drivers().await?))
}

pub async fn list_available_drivers(
    State(state): State<Arc<AppState>>,
) -> FreightResult<Json<Vec<DriverResponse>>> {
    Ok(Json(state.user_service.list_available_drivers().await?))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> FreightResult<Json<DriverResponse>> {
    state
        .user_service
        .get_driver(&driver_id)
        .await?
        .map(Json)
        .ok_or_else(|| FreightError::driver_not_found(&driver_id))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(update): Json<DriverUpdate>,
) -> FreightResult<Json<DriverResponse>> {
    Ok(Json(state.user_service.update_driver(&driver_id, update).await?))
}
