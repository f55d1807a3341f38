// src/models/vehicle.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_FUEL_TYPE: &str = "Diesel";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Available,
    #[serde(rename = "In-Use")]
    InUse,
    Maintenance,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub number: String,        // Registration plate, e.g. "MH-12-AB-9999"
    pub vehicle_type: String,  // e.g. "Tata Ace", "Truck"
    pub capacity_kg: f64,      // Maximum load in kilograms
    pub fuel_type: String,
    pub status: VehicleStatus,
    pub current_driver_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleRegistration {
    pub number: String,
    pub vehicle_type: String,
    pub capacity_kg: f64,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub under_maintenance: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub vehicle_id: Option<String>, // None unlinks the driver
    pub driver_id: String,
}

impl Vehicle {
    pub fn link_driver(&mut self, driver_id: &str, now: DateTime<Utc>) {
        self.current_driver_id = Some(driver_id.to_string());
        self.status = VehicleStatus::InUse;
        self.updated_at = now;
    }

    pub fn unlink_driver(&mut self, now: DateTime<Utc>) {
        self.current_driver_id = None;
        if self.status == VehicleStatus::InUse {
            self.status = VehicleStatus::Available;
        }
        self.updated_at = now;
    }
}
