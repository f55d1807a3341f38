// src/models/route.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// An admin-declared lane between two cities. Direction does not matter:
/// Mumbai→Pune and Pune→Mumbai are the same route.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub preferred_driver_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    #[serde(default)]
    pub preferred_driver_id: Option<String>,
}

fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// Order-independent identity of a city pair.
pub fn city_pair_key(a: &str, b: &str) -> String {
    let (a, b) = (normalize_city(a), normalize_city(b));
    if a <= b {
        format!("{}|{}", a, b)
    } else {
        format!("{}|{}", b, a)
    }
}

impl Route {
    pub fn connects(&self, a: &str, b: &str) -> bool {
        city_pair_key(&self.origin, &self.destination) == city_pair_key(a, b)
    }

    pub fn pair_key(&self) -> String {
        city_pair_key(&self.origin, &self.destination)
    }
}

/// Looks up the route for a city pair in either direction.
pub fn find_route<'a>(routes: &'a [Route], from: &str, to: &str) -> Option<&'a Route> {
    routes.iter().find(|route| route.connects(from, to))
}
