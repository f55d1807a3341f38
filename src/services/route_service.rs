// src/services/route_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{require_fields, FreightError as AppError},
    models::{
        route::{Route, RouteRequest},
        user::User,
    },
    services::store_service::{EntityStore, StoreKeys, UnitOfWork},
    utils::id_generator::{IdType, WithGeneratedId},
};

#[async_trait]
pub trait RouteOperations: Send + Sync {
    async fn create_route(&self, request: RouteRequest) -> Result<Route, AppError>;
    async fn get_route(&self, route_id: &str) -> Result<Option<Route>, AppError>;
    async fn list_routes(&self) -> Result<Vec<Route>, AppError>;
    async fn update_route(&self, route_id: &str, request: RouteRequest) -> Result<Route, AppError>;
    async fn delete_route(&self, route_id: &str) -> Result<(), AppError>;
}

pub struct RouteService {
    store: Arc<EntityStore>,
}

impl RouteService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Checks the request and returns the normalised preferred driver id.
    async fn validate(&self, request: &RouteRequest) -> Result<Option<String>, AppError> {
        require_fields(&[
            ("origin", &request.origin),
            ("destination", &request.destination),
        ])?;

        // '|' separates the two cities in the pair key.
        for (field, city) in [("origin", &request.origin), ("destination", &request.destination)] {
            if city.contains('|') {
                return Err(AppError::validation_error(field, "must not contain '|'"));
            }
        }
        if request.origin.trim().to_lowercase() == request.destination.trim().to_lowercase() {
            return Err(AppError::validation_error("destination", "must differ from origin"));
        }
        if !(request.distance_km.is_finite() && request.distance_km > 0.0) {
            return Err(AppError::validation_error("distance_km", "must be a positive number"));
        }

        let preferred = request
            .preferred_driver_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        match preferred {
            Some(driver_id) => {
                let driver = self
                    .store
                    .get::<User>(driver_id)
                    .await?
                    .ok_or_else(|| AppError::driver_not_found(driver_id))?;
                if !driver.is_driver() {
                    return Err(AppError::validation_error(
                        "preferred_driver_id",
                        "must reference a user with the driver role",
                    ));
                }
                Ok(Some(driver.id))
            }
            None => Ok(None),
        }
    }

    fn already_exists(request: &RouteRequest) -> AppError {
        tracing::warn!(
            "Route already exists between {} and {}",
            request.origin,
            request.destination
        );
        AppError::conflict("Route already exists")
    }
}

#[async_trait]
impl RouteOperations for RouteService {
    async fn create_route(&self, request: RouteRequest) -> Result<Route, AppError> {
        tracing::info!("Creating route: {} <-> {}", request.origin, request.destination);

        let preferred_driver_id = self.validate(&request).await?;

        let pair_key = StoreKeys::route_pair(&request.origin, &request.destination);
        if self.store.load_by_key::<Route>(&pair_key).await?.is_some() {
            return Err(Self::already_exists(&request));
        }

        let now = Utc::now();
        let route = Route {
            id: String::new(),
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            distance_km: request.distance_km,
            preferred_driver_id,
            created_at: now,
            updated_at: now,
        }
        .with_generated_id(IdType::Route);

        let mut unit = UnitOfWork::new();
        unit.insert(&route)?;
        self.store.commit(unit).await?;

        tracing::info!("Route created: {} ({} km)", route.id, route.distance_km);
        Ok(route)
    }

    async fn get_route(&self, route_id: &str) -> Result<Option<Route>, AppError> {
        Ok(self.store.get::<Route>(route_id).await?)
    }

    async fn list_routes(&self) -> Result<Vec<Route>, AppError> {
        let mut routes: Vec<Route> = self.store.list().await?;
        routes.sort_by(|a, b| a.pair_key().cmp(&b.pair_key()));
        Ok(routes)
    }

    async fn update_route(&self, route_id: &str, request: RouteRequest) -> Result<Route, AppError> {
        tracing::info!("Updating route: {}", route_id);

        let before = self
            .store
            .load::<Route>(route_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Route {}", route_id)))?;

        let preferred_driver_id = self.validate(&request).await?;

        let pair_key = StoreKeys::route_pair(&request.origin, &request.destination);
        if let Some(existing) = self.store.load_by_key::<Route>(&pair_key).await? {
            if existing.record.id != route_id {
                return Err(Self::already_exists(&request));
            }
        }

        let mut route = before.record.clone();
        route.origin = request.origin.trim().to_string();
        route.destination = request.destination.trim().to_string();
        route.distance_km = request.distance_km;
        route.preferred_driver_id = preferred_driver_id;
        route.updated_at = Utc::now();

        let mut unit = UnitOfWork::new();
        unit.update(&before, &route)?;
        self.store.commit(unit).await?;

        Ok(route)
    }

    async fn delete_route(&self, route_id: &str) -> Result<(), AppError> {
        tracing::info!("Deleting route: {}", route_id);

        let before = self
            .store
            .load::<Route>(route_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Route {}", route_id)))?;

        let mut unit = UnitOfWork::new();
        unit.delete(&before);
        self.store.commit(unit).await?;
        Ok(())
    }
}
