// src/services/fixtures.rs
//! Seed records for service tests, written straight to the store so tests
//! don't pay for password hashing.
use chrono::Utc;
use std::sync::Arc;

use crate::{
    models::{
        driver::{DriverDetails, DriverProfile},
        route::Route,
        user::{User, UserRole},
        vehicle::{Vehicle, VehicleStatus},
    },
    services::store_service::{EntityStore, UnitOfWork},
    utils::id_generator::{IdType, WithGeneratedId},
};

pub fn store() -> Arc<EntityStore> {
    Arc::new(EntityStore::in_memory())
}

async fn insert<T: crate::services::store_service::Record>(store: &EntityStore, record: &T) {
    let mut unit = UnitOfWork::new();
    unit.insert(record).unwrap();
    store.commit(unit).await.unwrap();
}

pub async fn user(store: &EntityStore, name: &str, role: UserRole) -> User {
    let now = Utc::now();
    let user = User {
        id: String::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password_hash: "not-a-real-hash".to_string(),
        phone: "9876543210".to_string(),
        role,
        address: None,
        driver_details: (role == UserRole::Driver)
            .then(|| DriverDetails::from_profile(DriverProfile::default())),
        created_at: now,
        updated_at: now,
    }
    .with_generated_id(IdType::User);
    insert(store, &user).await;
    user
}

pub async fn sender(store: &EntityStore, name: &str) -> User {
    user(store, name, UserRole::Sender).await
}

pub async fn driver(store: &EntityStore, name: &str) -> User {
    user(store, name, UserRole::Driver).await
}

pub async fn vehicle(store: &EntityStore, number: &str, capacity_kg: f64) -> Vehicle {
    let now = Utc::now();
    let vehicle = Vehicle {
        id: String::new(),
        number: number.to_string(),
        vehicle_type: "Truck".to_string(),
        capacity_kg,
        fuel_type: "Diesel".to_string(),
        status: VehicleStatus::Available,
        current_driver_id: None,
        created_at: now,
        updated_at: now,
    }
    .with_generated_id(IdType::Vehicle);
    insert(store, &vehicle).await;
    vehicle
}

pub async fn route(
    store: &EntityStore,
    origin: &str,
    destination: &str,
    distance_km: f64,
    preferred_driver_id: Option<&str>,
) -> Route {
    let now = Utc::now();
    let route = Route {
        id: String::new(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        distance_km,
        preferred_driver_id: preferred_driver_id.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
    .with_generated_id(IdType::Route);
    insert(store, &route).await;
    route
}
