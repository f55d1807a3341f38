// src/services/user_service.rs
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{require_fields, FreightError as AppError},
    models::{
        driver::{DriverDetails, DriverResponse, DriverUpdate},
        shipment::Shipment,
        user::{User, UserRegistration, UserResponse, UserRole},
        vehicle::Vehicle,
    },
    services::store_service::{EntityStore, StoreKeys, UnitOfWork},
    utils::id_generator::{IdGenerator, IdType, WithGeneratedId},
};

#[async_trait]
pub trait UserOperations: Send + Sync {
    async fn register_user(&self, registration: UserRegistration) -> Result<UserResponse, AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserResponse>, AppError>;
    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverResponse>, AppError>;
    async fn update_driver(&self, driver_id: &str, update: DriverUpdate) -> Result<DriverResponse, AppError>;
    async fn list_drivers(&self) -> Result<Vec<DriverResponse>, AppError>;
    async fn list_available_drivers(&self) -> Result<Vec<DriverResponse>, AppError>;
}

pub struct UserService {
    store: Arc<EntityStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<EntityStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal_error(format!("Hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }

    fn validate_registration(registration: &UserRegistration) -> Result<(), AppError> {
        require_fields(&[
            ("name", &registration.name),
            ("email", &registration.email),
            ("password", &registration.password),
            ("phone", &registration.phone),
        ])?;

        if !registration.email.contains('@') {
            return Err(AppError::validation_error("email", "must be a valid email address"));
        }
        Ok(())
    }
}

/// Trimmed value of an optional form field; blank counts as not provided.
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Load a driver carries right now: the summed weight and count of their
/// shipments in an active status. Never stored, so it cannot drift.
pub async fn driver_workload(store: &EntityStore, driver_id: &str) -> Result<(f64, usize), AppError> {
    let shipments: Vec<Shipment> = store
        .list_in(&StoreKeys::shipments_by_driver(driver_id))
        .await?;

    Ok(shipments
        .iter()
        .filter(|shipment| shipment.status.is_active())
        .fold((0.0, 0), |(load, count), shipment| (load + shipment.weight_kg, count + 1)))
}

/// Builds the admin-facing view of a driver with their vehicle and derived load.
pub async fn driver_view(store: &EntityStore, driver: User) -> Result<DriverResponse, AppError> {
    let (current_load_kg, active_shipments) = driver_workload(store, &driver.id).await?;
    let vehicle = match driver.assigned_vehicle_id() {
        Some(vehicle_id) => store.get::<Vehicle>(vehicle_id).await?,
        None => None,
    };
    let details = driver.driver_details.unwrap_or_else(|| DriverDetails::from_profile(Default::default()));

    Ok(DriverResponse {
        id: driver.id,
        name: driver.name,
        email: driver.email,
        phone: driver.phone,
        is_available: details.is_available,
        current_location: details.current_location,
        current_load_kg,
        active_shipments,
        vehicle,
    })
}

#[async_trait]
impl UserOperations for UserService {
    async fn register_user(&self, registration: UserRegistration) -> Result<UserResponse, AppError> {
        tracing::info!("Registering {} user: {}", registration.role, registration.email);

        Self::validate_registration(&registration)?;

        let email_key = StoreKeys::user_email(&registration.email);
        if self.store.load_by_key::<User>(&email_key).await?.is_some() {
            tracing::warn!("Registration rejected, email already in use: {}", registration.email);
            return Err(AppError::conflict("User already exists with this email"));
        }

        let password_hash = self.hash_password(&registration.password).await?;
        let now = Utc::now();

        let driver_details = match registration.role {
            UserRole::Driver => Some(DriverDetails::from_profile(registration.driver)),
            UserRole::Sender | UserRole::Admin => None,
        };

        let user = User {
            id: String::new(),
            name: registration.name.trim().to_string(),
            email: registration.email.trim().to_string(),
            password_hash,
            phone: registration.phone.trim().to_string(),
            role: registration.role,
            address: registration.address,
            driver_details,
            created_at: now,
            updated_at: now,
        }
        .with_generated_id(IdType::User);

        let mut unit = UnitOfWork::new();
        unit.insert(&user)?;
        self.store.commit(unit).await?;

        tracing::info!("User registered successfully: {}", user.id);

        Ok(user.into())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserResponse>, AppError> {
        if !IdGenerator::validate_id(user_id, Some(IdType::User)) {
            tracing::warn!("Invalid user ID format: {}", user_id);
            return Ok(None);
        }

        tracing::debug!("Getting user: {}", user_id);

        Ok(self.store.get::<User>(user_id).await?.map(UserResponse::from))
    }

    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverResponse>, AppError> {
        tracing::debug!("Getting driver: {}", driver_id);

        match self.store.get::<User>(driver_id).await? {
            Some(user) if user.is_driver() => Ok(Some(driver_view(&self.store, user).await?)),
            _ => Ok(None),
        }
    }

    async fn update_driver(&self, driver_id: &str, update: DriverUpdate) -> Result<DriverResponse, AppError> {
        tracing::info!("Updating driver profile: {}", driver_id);

        let before = self
            .store
            .load::<User>(driver_id)
            .await?
            .filter(|driver| driver.record.is_driver())
            .ok_or_else(|| AppError::driver_not_found(driver_id))?;

        let mut driver = before.record.clone();
        if let Some(name) = provided(update.name) {
            driver.name = name;
        }
        if let Some(phone) = provided(update.phone) {
            driver.phone = phone;
        }
        if let Some(email) = provided(update.email) {
            if !email.contains('@') {
                return Err(AppError::validation_error("email", "must be a valid email address"));
            }
            let owner = self.store.load_by_key::<User>(&StoreKeys::user_email(&email)).await?;
            if owner.is_some_and(|owner| owner.record.id != driver.id) {
                tracing::warn!("Profile update rejected, email already in use: {}", email);
                return Err(AppError::conflict("User already exists with this email"));
            }
            driver.email = email;
        }
        if let Some(password) = update.password.filter(|password| !password.trim().is_empty()) {
            driver.password_hash = self.hash_password(&password).await?;
        }
        if let Some(details) = driver.driver_details.as_mut() {
            if let Some(location) = provided(update.current_location) {
                details.current_location = location;
            }
            if let Some(license_number) = provided(update.license_number) {
                details.license_number = Some(license_number);
            }
        }
        driver.updated_at = Utc::now();

        // An email change moves the unique key; a racing claim fails the guard.
        let mut unit = UnitOfWork::new();
        unit.update(&before, &driver)?;
        self.store.commit(unit).await?;

        tracing::info!("Driver profile updated: {}", driver.id);
        driver_view(&self.store, driver).await
    }

    async fn list_drivers(&self) -> Result<Vec<DriverResponse>, AppError> {
        let mut drivers: Vec<User> = self
            .store
            .list_in(&StoreKeys::users_by_role(UserRole::Driver))
            .await?;
        drivers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        tracing::debug!("Listing {} drivers", drivers.len());

        try_join_all(drivers.into_iter().map(|driver| driver_view(&self.store, driver))).await
    }

    async fn list_available_drivers(&self) -> Result<Vec<DriverResponse>, AppError> {
        Ok(self
            .list_drivers()
            .await?
            .into_iter()
            .filter(|driver| driver.is_available)
            .collect())
    }
}
