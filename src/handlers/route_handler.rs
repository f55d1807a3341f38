// src/handlers/route_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::{FreightError, FreightResult},
    models::route::{Route, RouteRequest},
    services::route_service::RouteOperations,
    state::AppState,
};

pub async fn list_routes(State(state): State<Arc<AppState>>) -> FreightResult<Json<Vec<Route>>> {
    Ok(Json(state.route_service.list_routes().await?))
}

pub async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> FreightResult<(StatusCode, Json<Route>)> {
    let route = state.route_service.create_route(request).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> FreightResult<Json<Route>> {
    state
        .route_service
        .get_route(&route_id)
        .await?
        .map(Json)
        .ok_or_else(|| FreightError::not_found(format!("Route {}", route_id)))
}

pub async fn update_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
    Json(request): Json<RouteRequest>,
) -> FreightResult<Json<Route>> {
    Ok(Json(state.route_service.update_route(&route_id, request).await?))
}

pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> FreightResult<StatusCode> {
    state.route_service.delete_route(&route_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
