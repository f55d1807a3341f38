// src/services/eligibility.rs
use serde::{Deserialize, Serialize};

use crate::models::{
    driver::DriverResponse,
    route::{find_route, Route},
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Restriction {
    /// No route or no designated driver: anyone available may be offered.
    Unrestricted,
    /// The route reserves the lane for one driver. `available` is false when
    /// that driver is busy, in which case nobody is offered.
    Designated {
        route_id: String,
        driver_id: String,
        available: bool,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Eligibility {
    pub restriction: Restriction,
    pub drivers: Vec<DriverResponse>,
}

/// Narrows the available-driver pool for a shipment between `from` and `to`.
/// Only shapes what an admin is offered; the assignment engine applies its own
/// policy check.
pub fn eligible_drivers(
    from: &str,
    to: &str,
    routes: &[Route],
    available_pool: Vec<DriverResponse>,
) -> Eligibility {
    let designated = find_route(routes, from, to)
        .and_then(|route| route.preferred_driver_id.as_ref().map(|driver_id| (route, driver_id)));

    match designated {
        Some((route, driver_id)) => {
            let drivers: Vec<DriverResponse> = available_pool
                .into_iter()
                .filter(|driver| &driver.id == driver_id)
                .collect();
            Eligibility {
                restriction: Restriction::Designated {
                    route_id: route.id.clone(),
                    driver_id: driver_id.clone(),
                    available: !drivers.is_empty(),
                },
                drivers,
            }
        }
        None => Eligibility {
            restriction: Restriction::Unrestricted,
            drivers: available_pool,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn driver(id: &str) -> DriverResponse {
        DriverResponse {
            id: id.to_string(),
            name: format!("Driver {}", id),
            email: format!("{}@example.com", id),
            phone: "9999999999".to_string(),
            is_available: true,
            current_location: "Pune".to_string(),
            current_load_kg: 0.0,
            active_shipments: 0,
            vehicle: None,
        }
    }

    fn route(preferred: Option<&str>) -> Route {
        Route {
            id: "rte-251019-mumpune1".to_string(),
            origin: "Mumbai".to_string(),
            destination: "Pune".to_string(),
            distance_km: 150.0,
            preferred_driver_id: preferred.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_designated_driver_only() {
        let result = eligible_drivers(
            "Pune",
            "Mumbai",
            &[route(Some("d2"))],
            vec![driver("d1"), driver("d2"), driver("d3")],
        );
        assert_eq!(result.drivers.len(), 1);
        assert_eq!(result.drivers[0].id, "d2");
        assert!(matches!(result.restriction, Restriction::Designated { available: true, .. }));
    }

    #[test]
    fn test_busy_designated_driver_yields_nobody() {
        let result = eligible_drivers("Mumbai", "Pune", &[route(Some("d9"))], vec![driver("d1"), driver("d2")]);
        assert!(result.drivers.is_empty());
        assert!(matches!(
            result.restriction,
            Restriction::Designated { ref driver_id, available: false, .. } if driver_id == "d9"
        ));
    }

    #[test]
    fn test_full_pool_without_policy() {
        let pool = vec![driver("d1"), driver("d2")];
        let result = eligible_drivers("Mumbai", "Pune", &[route(None)], pool.clone());
        assert_eq!(result.drivers, pool);
        assert_eq!(result.restriction, Restriction::Unrestricted);

        let result = eligible_drivers("Delhi", "Agra", &[route(Some("d1"))], pool.clone());
        assert_eq!(result.drivers, pool);
    }
}
