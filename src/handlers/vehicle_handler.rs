// src/handlers/vehicle_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::{FreightError, FreightResult},
    models::{
        driver::DriverResponse,
        vehicle::{Vehicle, VehicleAssignment, VehicleRegistration},
    },
    services::{assignment_service::AssignmentOperations, vehicle_service::VehicleOperations},
    state::AppState,
};

pub async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<VehicleRegistration>,
) -> FreightResult<(StatusCode, Json<Vehicle>)> {
    let vehicle = state.vehicle_service.register_vehicle(registration).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn list_vehicles(State(state): State<Arc<AppState>>) -> FreightResult<Json<Vec<Vehicle>>> {
    Ok(Json(state.vehicle_service.list_vehicles().await?))
}

pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
) -> FreightResult<Json<Vehicle>> {
    state
        .vehicle_service
        .get_vehicle(&vehicle_id)
        .await?
        .map(Json)
        .ok_or_else(|| FreightError::not_found(format!("Vehicle {}", vehicle_id)))
}

pub async fn assign_vehicle(
    State(state): State<Arc<AppState>>,
    Json(assignment): Json<VehicleAssignment>,
) -> FreightResult<Json<DriverResponse>> {
    Ok(Json(state.assignment_service.assign_vehicle(assignment).await?))
}
