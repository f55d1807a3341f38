use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::shipment::ShipmentStatus;
use crate::services::store_service::StoreError;

/// Main error type for the freightdesk service
#[derive(Debug, Error)]
pub enum FreightError {
    // Request errors
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),

    // Lifecycle and assignment errors
    #[error("Invalid OTP for shipment {0}")]
    InvalidOtp(String),
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: ShipmentStatus, to: ShipmentStatus },
    #[error("Vehicle capacity exceeded: {current_load_kg}kg loaded + {requested_kg}kg requested > {capacity_kg}kg")]
    CapacityExceeded {
        capacity_kg: f64,
        current_load_kg: f64,
        requested_kg: f64,
    },
    #[error("Route {route_id} is reserved for driver {designated_driver_id}")]
    PolicyViolation {
        route_id: String,
        designated_driver_id: String,
    },
    #[error("Driver {0} has no vehicle assigned")]
    NoVehicleAssigned(String),
    #[error("No route configured between {from} and {to}")]
    RouteUnavailable { from: String, to: String },

    // Validation errors
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<ValidationError>),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    // Infrastructure errors
    #[error("Store error: {0}")]
    Store(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal server error: {0}")]
    InternalServer(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for FreightError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, details) = match &self {
            FreightError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            FreightError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            FreightError::Conflict(_) => (StatusCode::CONFLICT, "conflict", None),

            FreightError::InvalidOtp(_) => (StatusCode::BAD_REQUEST, "invalid_otp", None),
            FreightError::IllegalTransition { from, to } => (
                StatusCode::CONFLICT,
                "illegal_transition",
                Some(serde_json::json!({ "from": from, "to": to })),
            ),
            FreightError::CapacityExceeded { capacity_kg, current_load_kg, requested_kg } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "capacity_exceeded",
                Some(serde_json::json!({
                    "capacity_kg": capacity_kg,
                    "current_load_kg": current_load_kg,
                    "requested_kg": requested_kg,
                })),
            ),
            FreightError::PolicyViolation { route_id, designated_driver_id } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "policy_violation",
                Some(serde_json::json!({
                    "route_id": route_id,
                    "designated_driver_id": designated_driver_id,
                })),
            ),
            FreightError::NoVehicleAssigned(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "no_vehicle_assigned", None)
            }
            FreightError::RouteUnavailable { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "route_unavailable", None)
            }

            FreightError::ValidationFailed(errors) => {
                (StatusCode::BAD_REQUEST, "validation_failed", serde_json::to_value(errors).ok())
            }
            FreightError::MissingRequiredField(_) => (StatusCode::BAD_REQUEST, "missing_field", None),

            // All other errors are treated as internal server errors
            FreightError::Store(_) | FreightError::Configuration(_) | FreightError::InternalServer(_) => {
                tracing::error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type FreightResult<T> = Result<T, FreightError>;

// Conversion implementations for common error types
impl From<StoreError> for FreightError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::GuardFailed { key } => {
                FreightError::Conflict(format!("{} was modified or is already taken", key))
            }
            StoreError::Contended => {
                FreightError::Conflict("Concurrent update detected, retry the request".to_string())
            }
            other => FreightError::Store(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FreightError {
    fn from(err: serde_json::Error) -> Self {
        FreightError::InternalServer(format!("JSON serialization error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for FreightError {
    fn from(err: bcrypt::BcryptError) -> Self {
        FreightError::InternalServer(format!("Password hashing failed: {}", err))
    }
}

// Helper functions for creating common errors
impl FreightError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        FreightError::BadRequest(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        FreightError::NotFound(resource.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        FreightError::Conflict(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        FreightError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        FreightError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn user_not_found(user_id: &str) -> Self {
        FreightError::NotFound(format!("User {}", user_id))
    }

    pub fn driver_not_found(driver_id: &str) -> Self {
        FreightError::NotFound(format!("Driver {}", driver_id))
    }

    pub fn shipment_not_found(shipment_id: &str) -> Self {
        FreightError::NotFound(format!("Shipment {}", shipment_id))
    }
}

/// Rejects blank strings, collecting one error per offending field.
pub fn require_fields(fields: &[(&str, &str)]) -> FreightResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    match missing.as_slice() {
        [] => Ok(()),
        [field] => Err(FreightError::MissingRequiredField(field.to_string())),
        fields => Err(FreightError::ValidationFailed(
            fields
                .iter()
                .map(|field| ValidationError {
                    field: field.to_string(),
                    message: "is required".to_string(),
                })
                .collect(),
        )),
    }
}
