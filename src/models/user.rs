// src/models/user.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::driver::{DriverDetails, DriverProfile};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Sender,  // Books shipments
    Driver,  // Carries shipments
    Admin,   // Assigns drivers, vehicles and routes
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Sender => "sender",
            UserRole::Driver => "driver",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub driver_details: Option<DriverDetails>, // Only set for drivers
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    pub password: String, // Will be hashed
    pub phone: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub driver: DriverProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub driver_details: Option<DriverDetails>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_driver(&self) -> bool {
        self.role == UserRole::Driver
    }

    pub fn is_available(&self) -> bool {
        self.driver_details
            .as_ref()
            .is_some_and(|details| details.is_available)
    }

    pub fn assigned_vehicle_id(&self) -> Option<&str> {
        self.driver_details
            .as_ref()
            .and_then(|details| details.assigned_vehicle_id.as_deref())
    }

    /// Flips driver availability. No-op for non-drivers.
    pub fn set_available(&mut self, available: bool, now: DateTime<Utc>) {
        if let Some(details) = self.driver_details.as_mut() {
            details.is_available = available;
        }
        self.updated_at = now;
    }

    pub fn set_assigned_vehicle(&mut self, vehicle_id: Option<String>, now: DateTime<Utc>) {
        if let Some(details) = self.driver_details.as_mut() {
            details.assigned_vehicle_id = vehicle_id;
        }
        self.updated_at = now;
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            address: user.address,
            driver_details: user.driver_details,
            created_at: user.created_at,
        }
    }
}
