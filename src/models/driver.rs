// src/models/driver.rs
use serde::{Deserialize, Serialize};

use crate::models::vehicle::Vehicle;

pub const DEFAULT_DRIVER_LOCATION: &str = "Pune";

/// Driver-only part of a user record. There is no load counter here: a
/// driver's load is always summed from their active shipments.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverDetails {
    pub license_number: Option<String>,
    pub is_available: bool,
    pub current_location: String,
    pub assigned_vehicle_id: Option<String>,
}

/// Driver fields accepted at registration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DriverProfile {
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
}

/// Profile changes a driver or admin may submit. Blank or missing fields are
/// left as they are.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DriverUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "location")]
    pub current_location: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// What an admin sees when picking a driver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_available: bool,
    pub current_location: String,
    pub current_load_kg: f64,
    pub active_shipments: usize,
    pub vehicle: Option<Vehicle>,
}

impl DriverDetails {
    pub fn from_profile(profile: DriverProfile) -> Self {
        Self {
            license_number: profile.license_number,
            is_available: true,
            current_location: profile
                .current_location
                .filter(|location| !location.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DRIVER_LOCATION.to_string()),
            assigned_vehicle_id: None,
        }
    }
}
