// src/services/mod.rs
pub mod assignment_service;
pub mod complaint_service;
pub mod cost_estimator;
pub mod eligibility;
pub mod route_service;
pub mod shipment_service;
pub mod store_backends;
pub mod store_service;
pub mod user_service;
pub mod vehicle_service;

#[cfg(test)]
pub(crate) mod fixtures;
