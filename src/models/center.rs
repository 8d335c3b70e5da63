use serde::{Deserialize, Serialize};

/// A health unit (hospital or health center). Uniqueness is by
/// (name, address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthUnit {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// "hospital" or "centro".
    pub kind: String,
}

/// A geolocated service point belonging to a unit (fixed entrance or mobile
/// clinic stop). Uniqueness is by (unit_id, lat, lon).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicLocation {
    pub id: i64,
    pub unit_id: i64,
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub status: String,
}

/// A ranked proximity result: an active location, its owning unit, and the
/// great-circle distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyCenter {
    pub location: ClinicLocation,
    pub unit: HealthUnit,
    pub distance_km: f64,
}
