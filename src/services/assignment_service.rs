// src/services/assignment_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::FreightError as AppError,
    models::{
        driver::DriverResponse,
        route::{find_route, Route},
        shipment::{Shipment, ShipmentAssignment, ShipmentEvent, ShipmentResponse, ShipmentStatus},
        user::User,
        vehicle::{Vehicle, VehicleAssignment, VehicleStatus},
    },
    services::{
        store_service::{EntityStore, UnitOfWork, Versioned},
        user_service::{driver_view, driver_workload},
    },
};

#[async_trait]
pub trait AssignmentOperations: Send + Sync {
    async fn assign_driver(&self, assignment: ShipmentAssignment) -> Result<ShipmentResponse, AppError>;
    async fn assign_vehicle(&self, assignment: VehicleAssignment) -> Result<DriverResponse, AppError>;
}

pub struct AssignmentService {
    store: Arc<EntityStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    async fn load_driver(&self, driver_id: &str) -> Result<Versioned<User>, AppError> {
        let driver = self
            .store
            .load::<User>(driver_id)
            .await?
            .ok_or_else(|| AppError::driver_not_found(driver_id))?;

        if !driver.record.is_driver() {
            return Err(AppError::validation_error(
                "driver_id",
                "must reference a user with the driver role",
            ));
        }
        Ok(driver)
    }

    /// Route policy and capacity checks, skipped when an admin forces the
    /// assignment.
    async fn check_policy(&self, shipment: &Shipment, driver: &User) -> Result<(), AppError> {
        let routes: Vec<Route> = self.store.list().await?;
        if let Some(route) = find_route(&routes, &shipment.from, &shipment.to) {
            if let Some(designated) = route.preferred_driver_id.as_deref() {
                if designated != driver.id {
                    tracing::warn!(
                        "Route {} is reserved for {}, rejecting driver {}",
                        route.id,
                        designated,
                        driver.id
                    );
                    return Err(AppError::PolicyViolation {
                        route_id: route.id.clone(),
                        designated_driver_id: designated.to_string(),
                    });
                }
            }
        }

        let no_vehicle = || AppError::NoVehicleAssigned(driver.id.clone());
        let vehicle_id = driver.assigned_vehicle_id().ok_or_else(no_vehicle)?;
        let vehicle = self
            .store
            .get::<Vehicle>(vehicle_id)
            .await?
            .ok_or_else(no_vehicle)?;

        let (current_load_kg, _) = driver_workload(&self.store, &driver.id).await?;
        if current_load_kg + shipment.weight_kg > vehicle.capacity_kg {
            tracing::warn!(
                "Capacity exceeded for driver {}: {} + {} > {}",
                driver.id,
                current_load_kg,
                shipment.weight_kg,
                vehicle.capacity_kg
            );
            return Err(AppError::CapacityExceeded {
                capacity_kg: vehicle.capacity_kg,
                current_load_kg,
                requested_kg: shipment.weight_kg,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentOperations for AssignmentService {
    async fn assign_driver(&self, assignment: ShipmentAssignment) -> Result<ShipmentResponse, AppError> {
        tracing::info!(
            "Assigning driver {} to shipment {}",
            assignment.driver_id,
            assignment.shipment_id
        );

        let before = self
            .store
            .load::<Shipment>(&assignment.shipment_id)
            .await?
            .ok_or_else(|| AppError::shipment_not_found(&assignment.shipment_id))?;
        let from = before.record.status;
        let next = from.apply(ShipmentEvent::AssignDriver).ok_or(AppError::IllegalTransition {
            from,
            to: ShipmentStatus::PaymentPending,
        })?;

        let driver = self.load_driver(&assignment.driver_id).await?;

        if assignment.force {
            tracing::warn!(
                "Force-assigning driver {} to shipment {}, policy checks skipped",
                driver.record.id,
                before.record.id
            );
        } else {
            self.check_policy(&before.record, &driver.record).await?;
        }

        let now = Utc::now();
        let mut shipment = before.record.clone();
        shipment.driver_id = Some(driver.record.id.clone());
        shipment.status = next;
        shipment.updated_at = now;

        let mut busy = driver.record.clone();
        busy.set_available(false, now);

        let mut unit = UnitOfWork::new();
        unit.update(&before, &shipment)?;
        unit.update(&driver, &busy)?;
        self.store.commit(unit).await?;

        tracing::info!("Shipment {} assigned to driver {}", shipment.id, busy.id);
        Ok(shipment.into())
    }

    async fn assign_vehicle(&self, assignment: VehicleAssignment) -> Result<DriverResponse, AppError> {
        let vehicle_id = assignment
            .vehicle_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        tracing::info!("Assigning vehicle {:?} to driver {}", vehicle_id, assignment.driver_id);

        let driver = self.load_driver(&assignment.driver_id).await?;

        let target = match vehicle_id {
            Some(id) => {
                let vehicle = self
                    .store
                    .load::<Vehicle>(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Vehicle {}", id)))?;
                if vehicle.record.status == VehicleStatus::Maintenance {
                    return Err(AppError::validation_error("vehicle_id", "vehicle is under maintenance"));
                }
                Some(vehicle)
            }
            None => None,
        };

        let already_linked = driver.record.assigned_vehicle_id() == vehicle_id
            && target.as_ref().is_none_or(|vehicle| {
                vehicle.record.current_driver_id.as_deref() == Some(driver.record.id.as_str())
            });
        if already_linked {
            tracing::debug!("Driver {} already has vehicle {:?}", driver.record.id, vehicle_id);
            return driver_view(&self.store, driver.into_inner()).await;
        }

        let now = Utc::now();
        let mut unit = UnitOfWork::new();

        // Free the driver's previous vehicle.
        if let Some(previous_id) = driver.record.assigned_vehicle_id().filter(|id| Some(*id) != vehicle_id) {
            if let Some(previous) = self.store.load::<Vehicle>(previous_id).await? {
                if previous.record.current_driver_id.as_deref() == Some(driver.record.id.as_str()) {
                    let mut released = previous.record.clone();
                    released.unlink_driver(now);
                    unit.update(&previous, &released)?;
                }
            }
        }

        if let Some(vehicle) = &target {
            // Take the vehicle away from whoever drove it before.
            if let Some(other_id) = vehicle
                .record
                .current_driver_id
                .as_deref()
                .filter(|id| *id != driver.record.id)
            {
                if let Some(other) = self.store.load::<User>(other_id).await? {
                    if other.record.assigned_vehicle_id() == Some(vehicle.record.id.as_str()) {
                        let mut unlinked = other.record.clone();
                        unlinked.set_assigned_vehicle(None, now);
                        unit.update(&other, &unlinked)?;
                    }
                }
                tracing::info!("Vehicle {} moves from driver {} to {}", vehicle.record.id, other_id, driver.record.id);
            }

            let mut linked = vehicle.record.clone();
            linked.link_driver(&driver.record.id, now);
            unit.update(vehicle, &linked)?;
        }

        let mut updated = driver.record.clone();
        updated.set_assigned_vehicle(vehicle_id.map(str::to_string), now);
        unit.update(&driver, &updated)?;
        self.store.commit(unit).await?;

        tracing::info!("Driver {} now has vehicle {:?}", updated.id, vehicle_id);
        driver_view(&self.store, updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shipment::ShipmentRequest;
    use crate::services::{
        fixtures,
        shipment_service::{ShipmentOperations, ShipmentService},
    };

    fn link(vehicle: &Vehicle, driver: &User) -> VehicleAssignment {
        VehicleAssignment {
            vehicle_id: Some(vehicle.id.clone()),
            driver_id: driver.id.clone(),
        }
    }

    fn assignment(shipment_id: &str, driver_id: &str, force: bool) -> ShipmentAssignment {
        ShipmentAssignment {
            shipment_id: shipment_id.to_string(),
            driver_id: driver_id.to_string(),
            force,
        }
    }

    async fn shipment(store: &Arc<EntityStore>, sender: &User, weight_kg: f64) -> ShipmentResponse {
        ShipmentService::new(store.clone())
            .create_shipment(ShipmentRequest {
                sender_id: sender.id.clone(),
                from: "Mumbai".to_string(),
                to: "Pune".to_string(),
                product_name: "Cement".to_string(),
                weight_kg,
                cost: 900.0,
                dimensions: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reassigning_vehicle_unlinks_previous_driver() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let d1 = fixtures::driver(&store, "Ravi").await;
        let d2 = fixtures::driver(&store, "Kiran").await;
        let truck = fixtures::vehicle(&store, "MH-01", 1000.0).await;

        service.assign_vehicle(link(&truck, &d1)).await.unwrap();
        let view = service.assign_vehicle(link(&truck, &d2)).await.unwrap();
        assert_eq!(view.vehicle.as_ref().map(|v| v.id.as_str()), Some(truck.id.as_str()));

        let d1 = store.get::<User>(&d1.id).await.unwrap().unwrap();
        let d2 = store.get::<User>(&d2.id).await.unwrap().unwrap();
        let truck = store.get::<Vehicle>(&truck.id).await.unwrap().unwrap();
        assert_eq!(d1.assigned_vehicle_id(), None);
        assert_eq!(d2.assigned_vehicle_id(), Some(truck.id.as_str()));
        assert_eq!(truck.current_driver_id.as_deref(), Some(d2.id.as_str()));
        assert_eq!(truck.status, VehicleStatus::InUse);
    }

    #[tokio::test]
    async fn test_switching_vehicles_frees_the_old_one() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let driver = fixtures::driver(&store, "Ravi").await;
        let old = fixtures::vehicle(&store, "MH-01", 1000.0).await;
        let new = fixtures::vehicle(&store, "MH-02", 3000.0).await;

        service.assign_vehicle(link(&old, &driver)).await.unwrap();
        service.assign_vehicle(link(&new, &driver)).await.unwrap();

        let old = store.get::<Vehicle>(&old.id).await.unwrap().unwrap();
        assert_eq!(old.status, VehicleStatus::Available);
        assert!(old.current_driver_id.is_none());

        let view = service
            .assign_vehicle(VehicleAssignment { vehicle_id: None, driver_id: driver.id.clone() })
            .await
            .unwrap();
        assert!(view.vehicle.is_none());
        let new = store.get::<Vehicle>(&new.id).await.unwrap().unwrap();
        assert_eq!(new.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_vehicle_assignment_is_idempotent() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let driver = fixtures::driver(&store, "Ravi").await;
        let truck = fixtures::vehicle(&store, "MH-01", 1000.0).await;

        let first = service.assign_vehicle(link(&truck, &driver)).await.unwrap();
        let second = service.assign_vehicle(link(&truck, &driver)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_vehicle_under_maintenance_is_rejected() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let driver = fixtures::driver(&store, "Ravi").await;
        let truck = fixtures::vehicle(&store, "MH-01", 1000.0).await;

        let before = store.load::<Vehicle>(&truck.id).await.unwrap().unwrap();
        let mut broken = before.record.clone();
        broken.status = VehicleStatus::Maintenance;
        let mut unit = UnitOfWork::new();
        unit.update(&before, &broken).unwrap();
        store.commit(unit).await.unwrap();

        let result = service.assign_vehicle(link(&truck, &driver)).await;
        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_assign_driver_requires_vehicle_unless_forced() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let sender = fixtures::sender(&store, "Asha").await;
        let driver = fixtures::driver(&store, "Ravi").await;
        let parcel = shipment(&store, &sender, 100.0).await;

        let result = service.assign_driver(assignment(&parcel.id, &driver.id, false)).await;
        assert!(matches!(result, Err(AppError::NoVehicleAssigned(_))));

        let assigned = service.assign_driver(assignment(&parcel.id, &driver.id, true)).await.unwrap();
        assert_eq!(assigned.status, ShipmentStatus::PaymentPending);
        assert_eq!(assigned.driver_id.as_deref(), Some(driver.id.as_str()));
    }

    #[tokio::test]
    async fn test_capacity_counts_active_load() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let sender = fixtures::sender(&store, "Asha").await;
        let driver = fixtures::driver(&store, "Ravi").await;
        let truck = fixtures::vehicle(&store, "MH-01", 1000.0).await;
        service.assign_vehicle(link(&truck, &driver)).await.unwrap();

        let first = shipment(&store, &sender, 700.0).await;
        let second = shipment(&store, &sender, 400.0).await;
        service.assign_driver(assignment(&first.id, &driver.id, false)).await.unwrap();

        let result = service.assign_driver(assignment(&second.id, &driver.id, false)).await;
        assert!(matches!(
            result,
            Err(AppError::CapacityExceeded { capacity_kg, current_load_kg, requested_kg })
                if capacity_kg == 1000.0 && current_load_kg == 700.0 && requested_kg == 400.0
        ));

        let stored = store.get::<Shipment>(&second.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Pending);
        assert!(stored.driver_id.is_none());
    }

    #[tokio::test]
    async fn test_route_policy_blocks_other_drivers() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let sender = fixtures::sender(&store, "Asha").await;
        let designated = fixtures::driver(&store, "Ravi").await;
        let other = fixtures::driver(&store, "Kiran").await;
        let truck = fixtures::vehicle(&store, "MH-01", 1000.0).await;
        service.assign_vehicle(link(&truck, &other)).await.unwrap();
        let route = fixtures::route(&store, "Pune", "Mumbai", 150.0, Some(&designated.id)).await;
        let parcel = shipment(&store, &sender, 100.0).await;

        let result = service.assign_driver(assignment(&parcel.id, &other.id, false)).await;
        assert!(matches!(
            result,
            Err(AppError::PolicyViolation { route_id, designated_driver_id })
                if route_id == route.id && designated_driver_id == designated.id
        ));
        assert!(store.get::<User>(&other.id).await.unwrap().unwrap().is_available());

        service.assign_driver(assignment(&parcel.id, &other.id, true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_driver_rejects_non_pending_and_non_drivers() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let sender = fixtures::sender(&store, "Asha").await;
        let driver = fixtures::driver(&store, "Ravi").await;
        let parcel = shipment(&store, &sender, 100.0).await;

        let result = service.assign_driver(assignment(&parcel.id, &sender.id, true)).await;
        assert!(matches!(result, Err(AppError::ValidationFailed(_))));

        service.assign_driver(assignment(&parcel.id, &driver.id, true)).await.unwrap();
        let result = service.assign_driver(assignment(&parcel.id, &driver.id, true)).await;
        assert!(matches!(
            result,
            Err(AppError::IllegalTransition { from: ShipmentStatus::PaymentPending, .. })
        ));

        let result = service.assign_driver(assignment("shp-251019-missing0", &driver.id, true)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_racing_assignments_have_one_winner() {
        let store = fixtures::store();
        let service = AssignmentService::new(store.clone());
        let sender = fixtures::sender(&store, "Asha").await;
        let d1 = fixtures::driver(&store, "Ravi").await;
        let d2 = fixtures::driver(&store, "Kiran").await;
        let t1 = fixtures::vehicle(&store, "MH-01", 1000.0).await;
        let t2 = fixtures::vehicle(&store, "MH-02", 1000.0).await;
        service.assign_vehicle(link(&t1, &d1)).await.unwrap();
        service.assign_vehicle(link(&t2, &d2)).await.unwrap();
        let job = shipment(&store, &sender, 100.0).await;

        let (first, second) = tokio::join!(
            service.assign_driver(assignment(&job.id, &d1.id, false)),
            service.assign_driver(assignment(&job.id, &d2.id, false)),
        );

        let (winner, loser, won, lost) = match (first, second) {
            (Ok(won), lost) => (d1.id.clone(), d2.id.clone(), won, lost),
            (lost, Ok(won)) => (d2.id.clone(), d1.id.clone(), won, lost),
            (Err(a), Err(b)) => panic!("both assignments failed: {} / {}", a, b),
        };
        assert_eq!(won.driver_id.as_deref(), Some(winner.as_str()));
        assert!(matches!(lost, Err(AppError::Conflict(_))));

        let stored = store.get::<Shipment>(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.driver_id.as_deref(), Some(winner.as_str()));
        assert_eq!(stored.status, ShipmentStatus::PaymentPending);

        let winner = store.get::<User>(&winner).await.unwrap().unwrap();
        let loser = store.get::<User>(&loser).await.unwrap().unwrap();
        assert!(!winner.is_available());
        assert!(loser.is_available());
    }
}
