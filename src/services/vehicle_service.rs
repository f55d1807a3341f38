// src/services/vehicle_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{require_fields, FreightError as AppError},
    models::vehicle::{Vehicle, VehicleRegistration, VehicleStatus, DEFAULT_FUEL_TYPE},
    services::store_service::{EntityStore, StoreKeys, UnitOfWork},
    utils::id_generator::{IdType, WithGeneratedId},
};

#[async_trait]
pub trait VehicleOperations: Send + Sync {
    async fn register_vehicle(&self, registration: VehicleRegistration) -> Result<Vehicle, AppError>;
    async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError>;
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError>;
}

pub struct VehicleService {
    store: Arc<EntityStore>,
}

impl VehicleService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VehicleOperations for VehicleService {
    async fn register_vehicle(&self, registration: VehicleRegistration) -> Result<Vehicle, AppError> {
        tracing::info!("Registering vehicle: {}", registration.number);

        require_fields(&[
            ("number", &registration.number),
            ("vehicle_type", &registration.vehicle_type),
        ])?;
        if !(registration.capacity_kg.is_finite() && registration.capacity_kg > 0.0) {
            return Err(AppError::validation_error("capacity_kg", "must be a positive number"));
        }

        if self
            .store
            .load_by_key::<Vehicle>(&StoreKeys::vehicle_number(&registration.number))
            .await?
            .is_some()
        {
            tracing::warn!("Vehicle number already registered: {}", registration.number);
            return Err(AppError::conflict(format!(
                "Vehicle {} is already registered",
                registration.number.trim()
            )));
        }

        let now = Utc::now();
        let vehicle = Vehicle {
            id: String::new(),
            number: registration.number.trim().to_uppercase(),
            vehicle_type: registration.vehicle_type.trim().to_string(),
            capacity_kg: registration.capacity_kg,
            fuel_type: registration
                .fuel_type
                .filter(|fuel| !fuel.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FUEL_TYPE.to_string()),
            status: if registration.under_maintenance {
                VehicleStatus::Maintenance
            } else {
                VehicleStatus::Available
            },
            current_driver_id: None,
            created_at: now,
            updated_at: now,
        }
        .with_generated_id(IdType::Vehicle);

        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle)?;
        self.store.commit(unit).await?;

        tracing::info!("Vehicle registered successfully: {}", vehicle.id);
        Ok(vehicle)
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError> {
        tracing::debug!("Getting vehicle: {}", vehicle_id);
        Ok(self.store.get::<Vehicle>(vehicle_id).await?)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let mut vehicles: Vec<Vehicle> = self.store.list().await?;
        vehicles.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(vehicles)
    }
}
