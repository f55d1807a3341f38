// src/handlers/shipment_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::{FreightError, FreightResult},
    models::shipment::{
        CostBreakdown, EstimateRequest, ShipmentAssignment, ShipmentRequest, ShipmentResponse,
        ShipmentStatusUpdate,
    },
    services::{
        assignment_service::AssignmentOperations, eligibility::Eligibility,
        shipment_service::ShipmentOperations,
    },
    state::AppState,
};

pub async fn create_shipment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShipmentRequest>,
) -> FreightResult<(StatusCode, Json<ShipmentResponse>)> {
    let shipment = state.shipment_service.create_shipment(request).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn list_shipments(State(state): State<Arc<AppState>>) -> FreightResult<Json<Vec<ShipmentResponse>>> {
    Ok(Json(state.shipment_service.list_shipments().await?))
}

pub async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Path(shipment_id): Path<String>,
) -> FreightResult<Json<ShipmentResponse>> {
    state
        .shipment_service
        .get_shipment(&shipment_id)
        .await?
        .map(Json)
        .ok_or_else(|| FreightError::shipment_not_found(&shipment_id))
}

pub async fn assign_driver(
    State(state): State<Arc<AppState>>,
    Json(assignment): Json<ShipmentAssignment>,
) -> FreightResult<Json<ShipmentResponse>> {
    Ok(Json(state.assignment_service.assign_driver(assignment).await?))
}

pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(shipment_id): Path<String>,
) -> FreightResult<Json<ShipmentResponse>> {
    Ok(Json(state.shipment_service.record_payment(&shipment_id).await?))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ShipmentStatusUpdate>,
) -> FreightResult<Json<ShipmentResponse>> {
    Ok(Json(state.shipment_service.update_shipment_status(update).await?))
}

pub async fn list_by_sender(
    State(state): State<Arc<AppState>>,
    Path(sender_id): Path<String>,
) -> FreightResult<Json<Vec<ShipmentResponse>>> {
    Ok(Json(state.shipment_service.list_shipments_by_sender(&sender_id).await?))
}

pub async fn list_driver_jobs(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> FreightResult<Json<Vec<ShipmentResponse>>> {
    Ok(Json(state.shipment_service.list_active_jobs_for_driver(&driver_id).await?))
}

pub async fn eligible_drivers(
    State(state): State<Arc<AppState>>,
    Path(shipment_id): Path<String>,
) -> FreightResult<Json<Eligibility>> {
    Ok(Json(state.shipment_service.eligible_drivers(&shipment_id).await?))
}

pub async fn estimate_cost(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> FreightResult<Json<CostBreakdown>> {
    Ok(Json(state.shipment_service.estimate_cost(request).await?))
}
