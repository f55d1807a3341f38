// src/handlers/complaint_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::FreightResult,
    models::complaint::{Complaint, ComplaintRequest},
    services::complaint_service::ComplaintOperations,
    state::AppState,
};

pub async fn file_complaint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ComplaintRequest>,
) -> FreightResult<(StatusCode, Json<Complaint>)> {
    let complaint = state.complaint_service.file_complaint(request).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn list_complaints(State(state): State<Arc<AppState>>) -> FreightResult<Json<Vec<Complaint>>> {
    Ok(Json(state.complaint_service.list_complaints().await?))
}

pub async fn resolve_complaint(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> FreightResult<Json<Complaint>> {
    Ok(Json(state.complaint_service.resolve_complaint(&ticket_id).await?))
}
