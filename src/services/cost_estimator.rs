// src/services/cost_estimator.rs
use crate::models::{
    route::{find_route, Route},
    shipment::{CargoItem, CostBreakdown},
};

const RATE_PER_KM: f64 = 5.0;
const RATE_PER_KG: f64 = 15.0;
const VOLUMETRIC_DIVISOR: f64 = 5.0;
/// Used when a dimensions string cannot be read as `LxWxH`.
const DEFAULT_VOLUMETRIC_SCORE: f64 = 200.0;

/// Prices a consignment over a configured route. Returns `None` when no route
/// connects the two cities or when no item contributes a charge; a price is
/// never made up from an ad-hoc distance.
pub fn estimate_cost(
    origin: &str,
    destination: &str,
    items: &[CargoItem],
    routes: &[Route],
) -> Option<CostBreakdown> {
    let route = find_route(routes, origin, destination)?;

    let (cargo_charge, total_weight_kg) = items
        .iter()
        .filter(|item| item.weight > 0.0 && !item.dimensions.trim().is_empty())
        .map(|item| {
            let weight_kg = item.unit.to_kg(item.weight);
            (weight_kg * RATE_PER_KG + volumetric_score(&item.dimensions), weight_kg)
        })
        .fold((0.0, 0.0), |(charge, weight), (c, w)| (charge + c, weight + w));

    if cargo_charge <= 0.0 {
        return None;
    }

    let base_charge = route.distance_km * RATE_PER_KM;
    Some(CostBreakdown {
        route_id: route.id.clone(),
        distance_km: route.distance_km,
        base_charge,
        cargo_charge,
        total_weight_kg,
        total: (base_charge + cargo_charge).round() as u64,
    })
}

/// `(L × W × H) / 5` for a `"LxWxH"` string, `200` if it doesn't hold exactly
/// three numbers.
pub fn volumetric_score(dimensions: &str) -> f64 {
    let parts: Vec<&str> = dimensions.split(['x', 'X']).collect();
    let &[l, w, h] = parts.as_slice() else {
        return DEFAULT_VOLUMETRIC_SCORE;
    };

    let factor = |part: &str| part.trim().parse::<f64>().ok().filter(|value| value.is_finite());
    match (factor(l), factor(w), factor(h)) {
        (Some(l), Some(w), Some(h)) => (l * w * h) / VOLUMETRIC_DIVISOR,
        _ => DEFAULT_VOLUMETRIC_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shipment::WeightUnit;
    use chrono::Utc;

    fn routes() -> Vec<Route> {
        vec![Route {
            id: "rte-251019-mumpune1".to_string(),
            origin: "Mumbai".to_string(),
            destination: "Pune".to_string(),
            distance_km: 150.0,
            preferred_driver_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }]
    }

    fn item(weight: f64, unit: WeightUnit, dimensions: &str) -> CargoItem {
        CargoItem {
            name: "Crate".to_string(),
            weight,
            unit,
            dimensions: dimensions.to_string(),
        }
    }

    #[test]
    fn test_reference_estimate() {
        let estimate = estimate_cost("Mumbai", "Pune", &[item(50.0, WeightUnit::Kg, "10x10x10")], &routes()).unwrap();
        assert_eq!(estimate.base_charge, 750.0);
        assert_eq!(estimate.cargo_charge, 950.0);
        assert_eq!(estimate.total, 1700);
    }

    #[test]
    fn test_route_matches_in_reverse() {
        let estimate = estimate_cost("pune", "MUMBAI", &[item(50.0, WeightUnit::Kg, "10X10X10")], &routes()).unwrap();
        assert_eq!(estimate.total, 1700);
    }

    #[test]
    fn test_missing_route_is_unavailable() {
        assert!(estimate_cost("Mumbai", "Delhi", &[item(50.0, WeightUnit::Kg, "10x10x10")], &routes()).is_none());
    }

    #[test]
    fn test_no_chargeable_items_is_unavailable() {
        assert!(estimate_cost("Mumbai", "Pune", &[], &routes()).is_none());
        assert!(estimate_cost("Mumbai", "Pune", &[item(0.0, WeightUnit::Kg, "1x1x1")], &routes()).is_none());
        assert!(estimate_cost("Mumbai", "Pune", &[item(10.0, WeightUnit::Kg, "  ")], &routes()).is_none());
    }

    #[test]
    fn test_tonnes_and_unparsable_dimensions() {
        // 1.5 t = 1500 kg -> 22500 + 200 fallback, plus 750 base
        let estimate = estimate_cost("Mumbai", "Pune", &[item(1.5, WeightUnit::Tonnes, "big box")], &routes()).unwrap();
        assert_eq!(estimate.total_weight_kg, 1500.0);
        assert_eq!(estimate.total, 23450);
    }

    #[test]
    fn test_volumetric_score() {
        assert_eq!(volumetric_score("10x10x10"), 200.0);
        assert_eq!(volumetric_score("20 x 5 x 2"), 40.0);
        assert_eq!(volumetric_score("10x10"), DEFAULT_VOLUMETRIC_SCORE);
        assert_eq!(volumetric_score("10x10x10x10"), DEFAULT_VOLUMETRIC_SCORE);
        assert_eq!(volumetric_score("axbxc"), DEFAULT_VOLUMETRIC_SCORE);
        assert_eq!(volumetric_score("2x3x4x"), DEFAULT_VOLUMETRIC_SCORE);
        assert_eq!(volumetric_score("2xabcx3x4"), DEFAULT_VOLUMETRIC_SCORE);
        assert_eq!(volumetric_score("2x x4"), DEFAULT_VOLUMETRIC_SCORE);
    }
}
