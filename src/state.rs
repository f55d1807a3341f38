// src/state.rs
use std::sync::Arc;

use crate::{
    config::AppConfig,
    errors::FreightError,
    services::{
        assignment_service::AssignmentService,
        complaint_service::ComplaintService,
        route_service::RouteService,
        shipment_service::ShipmentService,
        store_service::{EntityStore, RedisStore, Store},
        user_service::UserService,
        vehicle_service::VehicleService,
    },
};

pub struct AppState {
    pub user_service: Arc<UserService>,
    pub vehicle_service: Arc<VehicleService>,
    pub route_service: Arc<RouteService>,
    pub shipment_service: Arc<ShipmentService>,
    pub assignment_service: Arc<AssignmentService>,
    pub complaint_service: Arc<ComplaintService>,
    pub store: Arc<EntityStore>,
    pub config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, FreightError> {
        let store = match config.redis_url.as_deref() {
            Some(redis_url) => {
                tracing::info!("Connecting to redis store");
                Store::Redis(RedisStore::connect(redis_url).await?)
            }
            None => {
                tracing::warn!("REDIS_URL not set, using in-memory store; data is lost on restart");
                Store::Memory(Default::default())
            }
        };

        Ok(Self::with_store(Arc::new(EntityStore::new(store)), config))
    }

    pub fn with_store(store: Arc<EntityStore>, config: AppConfig) -> Self {
        Self {
            user_service: Arc::new(UserService::new(store.clone(), config.bcrypt_cost)),
            vehicle_service: Arc::new(VehicleService::new(store.clone())),
            route_service: Arc::new(RouteService::new(store.clone())),
            shipment_service: Arc::new(ShipmentService::new(store.clone())),
            assignment_service: Arc::new(AssignmentService::new(store.clone())),
            complaint_service: Arc::new(ComplaintService::new(store.clone())),
            store,
            config,
        }
    }
}
