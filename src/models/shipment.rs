// src/models/shipment.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    Pending,         // Created by sender, waiting for a driver
    #[serde(rename = "Payment Pending")]
    PaymentPending,  // Driver assigned, waiting for sender payment
    Assigned,        // Paid, visible to the driver
    Picked,          // Driver confirmed pickup OTP
    #[serde(rename = "In-Transit")]
    InTransit,       // Journey started
    Delivered,       // Driver confirmed delivery OTP
    Cancelled,
}

/// Things that can happen to a shipment. Each maps to at most one edge of the
/// lifecycle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentEvent {
    AssignDriver,
    RecordPayment,
    ConfirmPickup,
    StartTransit,
    ConfirmDelivery,
    Cancel,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::PaymentPending => "Payment Pending",
            ShipmentStatus::Assigned => "Assigned",
            ShipmentStatus::Picked => "Picked",
            ShipmentStatus::InTransit => "In-Transit",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses during which the cargo counts against the driver's load.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::PaymentPending
                | ShipmentStatus::Assigned
                | ShipmentStatus::Picked
                | ShipmentStatus::InTransit
        )
    }

    /// Statuses listed on a driver's job board.
    pub fn is_driver_visible(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Assigned
                | ShipmentStatus::Picked
                | ShipmentStatus::InTransit
                | ShipmentStatus::Delivered
        )
    }

    /// Applies `event` to the current status. Any edge outside the lifecycle
    /// table yields `None`.
    pub fn apply(self, event: ShipmentEvent) -> Option<ShipmentStatus> {
        use ShipmentEvent::*;
        use ShipmentStatus::*;

        match (self, event) {
            (Pending, AssignDriver) => Some(PaymentPending),
            (PaymentPending, RecordPayment) => Some(Assigned),
            (Assigned, ConfirmPickup) => Some(Picked),
            (Picked, StartTransit) => Some(InTransit),
            (InTransit, ConfirmDelivery) => Some(Delivered),
            (Pending | PaymentPending, Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl ShipmentEvent {
    /// The event a caller asks for when requesting `target` through the
    /// generic status endpoint. Statuses only reachable through assignment or
    /// payment have no event here.
    pub fn for_target(target: ShipmentStatus) -> Option<ShipmentEvent> {
        match target {
            ShipmentStatus::Picked => Some(ShipmentEvent::ConfirmPickup),
            ShipmentStatus::InTransit => Some(ShipmentEvent::StartTransit),
            ShipmentStatus::Delivered => Some(ShipmentEvent::ConfirmDelivery),
            ShipmentStatus::Cancelled => Some(ShipmentEvent::Cancel),
            ShipmentStatus::Pending
            | ShipmentStatus::PaymentPending
            | ShipmentStatus::Assigned => None,
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shipment {
    pub id: String,
    pub shipment_code: String, // Human readable, e.g. "SHP-7KQ2M9XA"
    pub sender_id: String,
    pub driver_id: Option<String>,

    // Cargo
    pub from: String,
    pub to: String,
    pub product_name: String,
    pub weight_kg: f64,
    pub dimensions: Option<String>,

    // Cost & payment
    pub cost: f64,
    pub payment_status: PaymentStatus,

    pub status: ShipmentStatus,

    // Security
    pub pickup_otp: String,
    pub delivery_otp: String,

    pub created_at: DateTime<Utc>,
    pub picked_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipmentRequest {
    pub sender_id: String,
    pub from: String,
    pub to: String,
    pub product_name: String,
    pub weight_kg: f64,
    pub cost: f64,
    #[serde(default)]
    pub dimensions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipmentStatusUpdate {
    pub shipment_id: String,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipmentAssignment {
    pub shipment_id: String,
    pub driver_id: String,
    /// Admin override for route policy and capacity checks.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Tonnes,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CargoItem {
    #[serde(default)]
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub unit: WeightUnit,
    pub dimensions: String, // "LxWxH"
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EstimateRequest {
    pub from: String,
    pub to: String,
    pub items: Vec<CargoItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostBreakdown {
    pub route_id: String,
    pub distance_km: f64,
    pub base_charge: f64,
    pub cargo_charge: f64,
    pub total_weight_kg: f64,
    pub total: u64,
}

/// Shipment as seen by senders, drivers and admins. OTPs are exposed the same
/// way the booking screens receive them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipmentResponse {
    pub id: String,
    pub shipment_code: String,
    pub sender_id: String,
    pub driver_id: Option<String>,
    pub from: String,
    pub to: String,
    pub product_name: String,
    pub weight_kg: f64,
    pub dimensions: Option<String>,
    pub cost: f64,
    pub payment_status: PaymentStatus,
    pub status: ShipmentStatus,
    pub pickup_otp: String,
    pub delivery_otp: String,
    pub created_at: DateTime<Utc>,
    pub picked_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<Shipment> for ShipmentResponse {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id,
            shipment_code: shipment.shipment_code,
            sender_id: shipment.sender_id,
            driver_id: shipment.driver_id,
            from: shipment.from,
            to: shipment.to,
            product_name: shipment.product_name,
            weight_kg: shipment.weight_kg,
            dimensions: shipment.dimensions,
            cost: shipment.cost,
            payment_status: shipment.payment_status,
            status: shipment.status,
            pickup_otp: shipment.pickup_otp,
            delivery_otp: shipment.delivery_otp,
            created_at: shipment.created_at,
            picked_at: shipment.picked_at,
            delivered_at: shipment.delivered_at,
        }
    }
}

impl WeightUnit {
    pub fn to_kg(&self, weight: f64) -> f64 {
        match self {
            WeightUnit::Kg => weight,
            WeightUnit::Tonnes => weight * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_walks_the_lifecycle() {
        let mut status = ShipmentStatus::Pending;
        for event in [
            ShipmentEvent::AssignDriver,
            ShipmentEvent::RecordPayment,
            ShipmentEvent::ConfirmPickup,
            ShipmentEvent::StartTransit,
            ShipmentEvent::ConfirmDelivery,
        ] {
            status = status.apply(event).unwrap();
        }
        assert_eq!(status, ShipmentStatus::Delivered);
    }

    #[test]
    fn test_cancel_only_before_driver_confirmation() {
        assert_eq!(
            ShipmentStatus::Pending.apply(ShipmentEvent::Cancel),
            Some(ShipmentStatus::Cancelled)
        );
        assert_eq!(
            ShipmentStatus::PaymentPending.apply(ShipmentEvent::Cancel),
            Some(ShipmentStatus::Cancelled)
        );
        assert_eq!(ShipmentStatus::Assigned.apply(ShipmentEvent::Cancel), None);
        assert_eq!(ShipmentStatus::InTransit.apply(ShipmentEvent::Cancel), None);
        assert_eq!(ShipmentStatus::Delivered.apply(ShipmentEvent::Cancel), None);
    }

    #[test]
    fn test_jumps_are_rejected() {
        assert_eq!(ShipmentStatus::Pending.apply(ShipmentEvent::ConfirmDelivery), None);
        assert_eq!(ShipmentStatus::Assigned.apply(ShipmentEvent::StartTransit), None);
        assert_eq!(ShipmentStatus::Delivered.apply(ShipmentEvent::AssignDriver), None);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::PaymentPending).unwrap(),
            "\"Payment Pending\""
        );
        let status: ShipmentStatus = serde_json::from_str("\"In-Transit\"").unwrap();
        assert_eq!(status, ShipmentStatus::InTransit);
        assert_eq!(ShipmentStatus::InTransit.to_string(), "In-Transit");
    }

    #[test]
    fn test_active_and_visible_sets() {
        assert!(!ShipmentStatus::Pending.is_active());
        assert!(ShipmentStatus::PaymentPending.is_active());
        assert!(!ShipmentStatus::PaymentPending.is_driver_visible());
        assert!(ShipmentStatus::Delivered.is_driver_visible());
        assert!(!ShipmentStatus::Delivered.is_active());
    }

    #[test]
    fn test_tonnes_convert_to_kg() {
        assert_eq!(WeightUnit::Tonnes.to_kg(1.5), 1500.0);
        assert_eq!(WeightUnit::Kg.to_kg(1.5), 1.5);
    }
}
