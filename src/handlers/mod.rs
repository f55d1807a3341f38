// src/handlers/mod.rs
pub mod complaint_handler;
pub mod route_handler;
pub mod shipment_handler;
pub mod user_handler;
pub mod vehicle_handler;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::AppConfig, errors::FreightError, state::AppState};

fn cors_layer(config: &AppConfig) -> Result<CorsLayer, FreightError> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE]);

    match config.allowed_origin.as_deref() {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|e| FreightError::Configuration(format!("ALLOWED_ORIGIN: {}", e)))?;
            Ok(cors.allow_origin(origin))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_router(state: Arc<AppState>) -> Result<Router, FreightError> {
    let cors = cors_layer(&state.config)?;

    let router = Router::new()
        .route("/health", get(health))
        // Shipments
        .route(
            "/api/shipments",
            get(shipment_handler::list_shipments).post(shipment_handler::create_shipment),
        )
        .route("/api/shipments/assign", put(shipment_handler::assign_driver))
        .route("/api/shipments/status", put(shipment_handler::update_status))
        .route("/api/shipments/pay/:id", put(shipment_handler::record_payment))
        .route("/api/shipments/sender/:sender_id", get(shipment_handler::list_by_sender))
        .route("/api/shipments/:id", get(shipment_handler::get_shipment))
        .route("/api/shipments/:id/eligible-drivers", get(shipment_handler::eligible_drivers))
        .route("/api/driver/jobs/:driver_id", get(shipment_handler::list_driver_jobs))
        .route("/api/estimates", post(shipment_handler::estimate_cost))
        // Routes
        .route(
            "/api/routes",
            get(route_handler::list_routes).post(route_handler::create_route),
        )
        .route(
            "/api/routes/:id",
            get(route_handler::get_route)
                .put(route_handler::update_route)
                .delete(route_handler::delete_route),
        )
        // Fleet
        .route(
            "/api/vehicles",
            get(vehicle_handler::list_vehicles).post(vehicle_handler::register_vehicle),
        )
        .route("/api/vehicles/assign", put(vehicle_handler::assign_vehicle))
        .route("/api/vehicles/:id", get(vehicle_handler::get_vehicle))
        // Users
        .route("/api/users", post(user_handler::register_user))
        .route("/api/users/:id", get(user_handler::get_user))
        .route("/api/drivers", get(user_handler::list_drivers))
        .route("/api/drivers/available", get(user_handler::list_available_drivers))
        .route(
            "/api/drivers/:id",
            get(user_handler::get_driver).put(user_handler::update_driver),
        )
        // Complaints
        .route(
            "/api/complaints",
            get(complaint_handler::list_complaints).post(complaint_handler::file_complaint),
        )
        .route(
            "/api/complaints/resolve/:ticket_id",
            put(complaint_handler::resolve_complaint),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}
