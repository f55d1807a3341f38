// src/services/shipment_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{require_fields, FreightError as AppError},
    models::{
        route::Route,
        shipment::{
            CostBreakdown, EstimateRequest, PaymentStatus, Shipment, ShipmentEvent, ShipmentRequest,
            ShipmentResponse, ShipmentStatus, ShipmentStatusUpdate,
        },
        user::{User, UserRole},
    },
    services::{
        cost_estimator::estimate_cost,
        eligibility::{eligible_drivers, Eligibility},
        store_service::{EntityStore, StoreKeys, UnitOfWork, Versioned},
        user_service::driver_view,
    },
    utils::id_generator::{IdGenerator, IdType},
};

#[async_trait]
pub trait ShipmentOperations: Send + Sync {
    async fn create_shipment(&self, request: ShipmentRequest) -> Result<ShipmentResponse, AppError>;
    async fn get_shipment(&self, shipment_id: &str) -> Result<Option<ShipmentResponse>, AppError>;
    async fn list_shipments(&self) -> Result<Vec<ShipmentResponse>, AppError>;
    async fn list_shipments_by_sender(&self, sender_id: &str) -> Result<Vec<ShipmentResponse>, AppError>;
    async fn list_active_jobs_for_driver(&self, driver_id: &str) -> Result<Vec<ShipmentResponse>, AppError>;
    async fn record_payment(&self, shipment_id: &str) -> Result<ShipmentResponse, AppError>;
    async fn update_shipment_status(&self, update: ShipmentStatusUpdate) -> Result<ShipmentResponse, AppError>;
    async fn estimate_cost(&self, request: EstimateRequest) -> Result<CostBreakdown, AppError>;
    async fn eligible_drivers(&self, shipment_id: &str) -> Result<Eligibility, AppError>;
}

pub struct ShipmentService {
    store: Arc<EntityStore>,
}

impl ShipmentService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    async fn load_shipment(&self, shipment_id: &str) -> Result<Versioned<Shipment>, AppError> {
        self.store
            .load::<Shipment>(shipment_id)
            .await?
            .ok_or_else(|| AppError::shipment_not_found(shipment_id))
    }

    fn validate_request(request: &ShipmentRequest) -> Result<(), AppError> {
        require_fields(&[
            ("sender_id", &request.sender_id),
            ("from", &request.from),
            ("to", &request.to),
            ("product_name", &request.product_name),
        ])?;

        if !(request.weight_kg.is_finite() && request.weight_kg > 0.0) {
            return Err(AppError::validation_error("weight_kg", "must be a positive number"));
        }
        if !(request.cost.is_finite() && request.cost >= 0.0) {
            return Err(AppError::validation_error("cost", "must not be negative"));
        }
        Ok(())
    }

    /// Two codes drawn separately; redrawn on a clash so one can never stand
    /// in for the other.
    fn generate_otps() -> (String, String) {
        let pickup_otp = IdGenerator::generate_otp();
        let mut delivery_otp = IdGenerator::generate_otp();
        while delivery_otp == pickup_otp {
            delivery_otp = IdGenerator::generate_otp();
        }
        (pickup_otp, delivery_otp)
    }

    fn check_otp(shipment: &Shipment, expected: &str, submitted: Option<&str>) -> Result<(), AppError> {
        if submitted == Some(expected) {
            return Ok(());
        }
        tracing::warn!("OTP mismatch for shipment {}", shipment.id);
        Err(AppError::InvalidOtp(shipment.id.clone()))
    }

    /// Adds the write that makes the driver available again once `shipment_id`
    /// is no longer theirs to carry. A driver still holding other active
    /// shipments stays busy.
    async fn release_driver(
        &self,
        unit: &mut UnitOfWork,
        driver_id: &str,
        shipment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let Some(driver) = self.store.load::<User>(driver_id).await? else {
            tracing::warn!("Driver {} of shipment {} no longer exists", driver_id, shipment_id);
            return Ok(());
        };

        let jobs: Vec<Shipment> = self
            .store
            .list_in(&StoreKeys::shipments_by_driver(driver_id))
            .await?;
        let still_busy = jobs
            .iter()
            .any(|job| job.id != shipment_id && job.status.is_active());

        if still_busy {
            tracing::debug!("Driver {} keeps other active shipments", driver_id);
        } else if !driver.record.is_available() {
            let mut freed = driver.record.clone();
            freed.set_available(true, now);
            unit.update(&driver, &freed)?;
        }
        Ok(())
    }

    fn newest_first(mut shipments: Vec<Shipment>) -> Vec<ShipmentResponse> {
        shipments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        shipments.into_iter().map(ShipmentResponse::from).collect()
    }
}

#[async_trait]
impl ShipmentOperations for ShipmentService {
    async fn create_shipment(&self, request: ShipmentRequest) -> Result<ShipmentResponse, AppError> {
        tracing::info!(
            "Creating shipment for sender {}: {} -> {}",
            request.sender_id,
            request.from,
            request.to
        );

        Self::validate_request(&request)?;

        if self.store.get::<User>(&request.sender_id).await?.is_none() {
            return Err(AppError::user_not_found(&request.sender_id));
        }

        let (pickup_otp, delivery_otp) = Self::generate_otps();
        let now = Utc::now();
        let template = Shipment {
            id: String::new(),
            shipment_code: String::new(),
            sender_id: request.sender_id,
            driver_id: None,
            from: request.from.trim().to_string(),
            to: request.to.trim().to_string(),
            product_name: request.product_name.trim().to_string(),
            weight_kg: request.weight_kg,
            dimensions: request.dimensions.filter(|d| !d.trim().is_empty()),
            cost: request.cost,
            payment_status: PaymentStatus::Unpaid,
            status: ShipmentStatus::Pending,
            pickup_otp,
            delivery_otp,
            created_at: now,
            picked_at: None,
            delivered_at: None,
            updated_at: now,
        };

        let shipment = self.store.insert_generated(template, IdType::Shipment).await?;

        tracing::info!("Shipment created: {} ({})", shipment.id, shipment.shipment_code);
        Ok(shipment.into())
    }

    async fn get_shipment(&self, shipment_id: &str) -> Result<Option<ShipmentResponse>, AppError> {
        tracing::debug!("Getting shipment: {}", shipment_id);
        Ok(self.store.get::<Shipment>(shipment_id).await?.map(ShipmentResponse::from))
    }

    async fn list_shipments(&self) -> Result<Vec<ShipmentResponse>, AppError> {
        Ok(Self::newest_first(self.store.list().await?))
    }

    async fn list_shipments_by_sender(&self, sender_id: &str) -> Result<Vec<ShipmentResponse>, AppError> {
        tracing::debug!("Listing shipments for sender: {}", sender_id);
        let shipments = self
            .store
            .list_in(&StoreKeys::shipments_by_sender(sender_id))
            .await?;
        Ok(Self::newest_first(shipments))
    }

    async fn list_active_jobs_for_driver(&self, driver_id: &str) -> Result<Vec<ShipmentResponse>, AppError> {
        tracing::debug!("Listing jobs for driver: {}", driver_id);
        let shipments: Vec<Shipment> = self
            .store
            .list_in(&StoreKeys::shipments_by_driver(driver_id))
            .await?;

        Ok(Self::newest_first(
            shipments
                .into_iter()
                .filter(|shipment| shipment.status.is_driver_visible())
                .collect(),
        ))
    }

    async fn record_payment(&self, shipment_id: &str) -> Result<ShipmentResponse, AppError> {
        tracing::info!("Recording payment for shipment: {}", shipment_id);

        let before = self.load_shipment(shipment_id).await?;
        let from = before.record.status;
        let next = from
            .apply(ShipmentEvent::RecordPayment)
            .ok_or(AppError::IllegalTransition { from, to: ShipmentStatus::Assigned })?;

        let mut shipment = before.record.clone();
        shipment.status = next;
        shipment.payment_status = PaymentStatus::Paid;
        shipment.updated_at = Utc::now();

        let mut unit = UnitOfWork::new();
        unit.update(&before, &shipment)?;
        self.store.commit(unit).await?;

        tracing::info!("Shipment {} paid and assigned", shipment.id);
        Ok(shipment.into())
    }

    async fn update_shipment_status(&self, update: ShipmentStatusUpdate) -> Result<ShipmentResponse, AppError> {
        tracing::info!("Updating shipment {} to {}", update.shipment_id, update.status);

        let before = self.load_shipment(&update.shipment_id).await?;
        let from = before.record.status;
        let transition = ShipmentEvent::for_target(update.status)
            .and_then(|event| from.apply(event).map(|next| (event, next)));
        let Some((event, next)) = transition else {
            tracing::warn!("Rejected transition {} -> {} for {}", from, update.status, update.shipment_id);
            return Err(AppError::IllegalTransition { from, to: update.status });
        };

        match event {
            ShipmentEvent::ConfirmPickup => {
                Self::check_otp(&before.record, &before.record.pickup_otp, update.otp.as_deref())?
            }
            ShipmentEvent::ConfirmDelivery => {
                Self::check_otp(&before.record, &before.record.delivery_otp, update.otp.as_deref())?
            }
            _ => {}
        }

        let now = Utc::now();
        let mut shipment = before.record.clone();
        shipment.status = next;
        shipment.updated_at = now;

        let mut unit = UnitOfWork::new();
        match event {
            ShipmentEvent::ConfirmPickup => shipment.picked_at = Some(now),
            ShipmentEvent::ConfirmDelivery | ShipmentEvent::Cancel => {
                shipment.delivered_at = Some(now);
                if let Some(driver_id) = shipment.driver_id.as_deref() {
                    self.release_driver(&mut unit, driver_id, &shipment.id, now).await?;
                }
            }
            _ => {}
        }
        unit.update(&before, &shipment)?;
        self.store.commit(unit).await?;

        tracing::info!("Shipment {} moved {} -> {}", shipment.id, from, next);
        Ok(shipment.into())
    }

    async fn estimate_cost(&self, request: EstimateRequest) -> Result<CostBreakdown, AppError> {
        require_fields(&[("from", &request.from), ("to", &request.to)])?;

        let routes: Vec<Route> = self.store.list().await?;
        estimate_cost(&request.from, &request.to, &request.items, &routes).ok_or_else(|| {
            tracing::debug!("No estimate for {} -> {}", request.from, request.to);
            AppError::RouteUnavailable { from: request.from.clone(), to: request.to.clone() }
        })
    }

    async fn eligible_drivers(&self, shipment_id: &str) -> Result<Eligibility, AppError> {
        let shipment = self.load_shipment(shipment_id).await?.into_inner();
        let routes: Vec<Route> = self.store.list().await?;

        let drivers: Vec<User> = self
            .store
            .list_in(&StoreKeys::users_by_role(UserRole::Driver))
            .await?;
        let mut pool = try_join_all(
            drivers
                .into_iter()
                .filter(User::is_available)
                .map(|driver| driver_view(&self.store, driver)),
        )
        .await?;
        pool.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        Ok(eligible_drivers(&shipment.from, &shipment.to, &routes, pool))
    }
}
