use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{ClinicLocation, HealthUnit, NearbyCenter};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bounds for a proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub limit: usize,
    pub max_km: f64,
}

impl Default for NearbyQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            max_km: 500.0,
        }
    }
}

/// Great-circle distance between two coordinates via the haversine formula.
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

struct SeedUnit {
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    kind: &'static str,
    locations: &'static [(f64, f64, &'static str)],
}

/// Fixed bootstrap dataset: hospitals and health centers across Nicaragua,
/// each with at least one geolocated service point.
const SEED_UNITS: &[SeedUnit] = &[
    SeedUnit {
        name: "Hospital Metropolitano Vivian Pellas",
        address: "Carretera a Masaya, Km 9.8, Managua",
        phone: "(505) 2255-6900",
        kind: "hospital",
        locations: &[(12.1218, -86.2705, "Entrada principal")],
    },
    SeedUnit {
        name: "Hospital Escuela Antonio Lenín Fonseca",
        address: "Distrito II, Managua",
        phone: "(505) 2253-3939",
        kind: "hospital",
        locations: &[(12.1437, -86.2736, "Urgencias")],
    },
    SeedUnit {
        name: "Hospital Dr. Roberto Calderón (Manolo Morales)",
        address: "Carretera Norte, Managua",
        phone: "(505) 2244-1414",
        kind: "hospital",
        locations: &[(12.1106, -86.2599, "Emergencias")],
    },
    SeedUnit {
        name: "Centro de Salud Sócrates Flores",
        address: "Reparto Schick, Managua",
        phone: "(505) 2265-xxxx",
        kind: "centro",
        locations: &[(12.1048, -86.2522, "Módulo principal")],
    },
    SeedUnit {
        name: "Hospital Escuela Oscar Danilo Rosales (HEODRA)",
        address: "León",
        phone: "(505) 2311-5800",
        kind: "hospital",
        locations: &[(12.4356, -86.8796, "Guardia")],
    },
    SeedUnit {
        name: "Hospital Japón-Nicaragua",
        address: "Granada",
        phone: "(505) 2552-xxxx",
        kind: "hospital",
        locations: &[(11.9305, -85.9562, "Acceso principal")],
    },
    SeedUnit {
        name: "Hospital Humberto Alvarado Vásquez",
        address: "Masaya",
        phone: "(505) 2522-xxxx",
        kind: "hospital",
        locations: &[(11.9752, -86.0940, "Emergencias")],
    },
    SeedUnit {
        name: "Hospital Regional César Amador Molina",
        address: "Matagalpa",
        phone: "(505) 2772-xxxx",
        kind: "hospital",
        locations: &[(12.9272, -85.9170, "Bloque A")],
    },
    SeedUnit {
        name: "Hospital Regional Escuela San Juan de Dios",
        address: "Estelí",
        phone: "(505) 2713-xxxx",
        kind: "hospital",
        locations: &[(13.0900, -86.3530, "Recepción")],
    },
    SeedUnit {
        name: "Centro de Salud Altagracia",
        address: "Barrio Altagracia, Managua",
        phone: "(505) 2268-xxxx",
        kind: "centro",
        locations: &[(12.1399, -86.2784, "Consulta externa")],
    },
    SeedUnit {
        name: "Centro de Salud Villa Libertad",
        address: "Villa Libertad, Managua",
        phone: "(505) 2250-xxxx",
        kind: "centro",
        locations: &[(12.1126, -86.2098, "Módulo de triage")],
    },
];

impl Database {
    /// Unique indexes that reject duplicate units and locations at the
    /// source. Installed before any center write.
    pub fn ensure_center_unique_indexes(&self) -> Result<()> {
        self.conn().execute_batch(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_unit_name_address
                 ON health_units (name, address);
             CREATE UNIQUE INDEX IF NOT EXISTS ux_location_unit_lat_lon
                 ON clinic_locations (unit_id, lat, lon);",
        )?;
        Ok(())
    }

    /// Insert-if-missing by (name, address); returns the unit id either way.
    pub fn upsert_unit(&self, name: &str, address: &str, phone: &str, kind: &str) -> Result<i64> {
        let name = name.trim();
        let address = address.trim();
        self.conn().execute(
            "INSERT OR IGNORE INTO health_units (name, address, phone, kind)
             VALUES (?, ?, ?, ?)",
            params![name, address, phone.trim(), kind.trim()],
        )?;

        let id: i64 = self.conn().query_row(
            "SELECT id FROM health_units WHERE name = ? AND address = ?",
            params![name, address],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert-if-missing by (unit, lat, lon).
    pub fn upsert_clinic_location(
        &self,
        unit_id: i64,
        lat: f64,
        lon: f64,
        label: &str,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO clinic_locations (unit_id, label, lat, lon, status)
             VALUES (?, ?, ?, ?, 'active')",
            params![unit_id, label, lat, lon],
        )?;
        Ok(())
    }

    /// One-time bootstrap of the fixed center dataset: runs only while the
    /// unit catalog is empty. Not a sync; explicit adds keep working after.
    pub fn seed_health_centers_once(&self) -> Result<()> {
        self.ensure_center_unique_indexes()?;

        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM health_units", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let tx = self.conn().unchecked_transaction()?;
        for unit in SEED_UNITS {
            tx.execute(
                "INSERT OR IGNORE INTO health_units (name, address, phone, kind)
                 VALUES (?, ?, ?, ?)",
                params![unit.name, unit.address, unit.phone, unit.kind],
            )?;
            let unit_id: i64 = tx.query_row(
                "SELECT id FROM health_units WHERE name = ? AND address = ?",
                params![unit.name, unit.address],
                |row| row.get(0),
            )?;
            for (lat, lon, label) in unit.locations {
                tx.execute(
                    "INSERT OR IGNORE INTO clinic_locations
                         (unit_id, label, lat, lon, status)
                     VALUES (?, ?, ?, ?, 'active')",
                    params![unit_id, label, lat, lon],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Active locations with coordinates, joined to their owning unit, in
    /// row order.
    pub fn active_clinic_locations(&self) -> Result<Vec<(ClinicLocation, HealthUnit)>> {
        let mut stmt = self.conn().prepare(
            "SELECT l.id, l.unit_id, l.label, l.lat, l.lon, l.status,
                    u.id, u.name, u.address, u.phone, u.kind
               FROM clinic_locations l
               JOIN health_units u ON u.id = l.unit_id
              WHERE l.status = 'active'
                AND l.lat IS NOT NULL AND l.lon IS NOT NULL
              ORDER BY l.id ASC",
        )?;

        let rows = stmt
            .query_map([], |row: &Row| {
                Ok((
                    ClinicLocation {
                        id: row.get(0)?,
                        unit_id: row.get(1)?,
                        label: row.get(2)?,
                        lat: row.get(3)?,
                        lon: row.get(4)?,
                        status: row.get(5)?,
                    },
                    HealthUnit {
                        id: row.get(6)?,
                        name: row.get(7)?,
                        address: row.get(8)?,
                        phone: row.get(9)?,
                        kind: row.get(10)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Rank active centers by great-circle distance from the query point:
    /// keep finite distances within `max_km`, ascending, at most `limit`
    /// results. Ties keep their original row order (stable sort). An empty
    /// result is a normal answer, not an error.
    pub fn nearby_centers(&self, lat: f64, lon: f64, query: NearbyQuery) -> Result<Vec<NearbyCenter>> {
        let mut ranked: Vec<NearbyCenter> = self
            .active_clinic_locations()?
            .into_iter()
            .map(|(location, unit)| {
                let distance_km = haversine_km(lat, lon, location.lat, location.lon);
                NearbyCenter {
                    location,
                    unit,
                    distance_km,
                }
            })
            .filter(|c| c.distance_km.is_finite() && c.distance_km <= query.max_km)
            .collect();

        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(query.limit);
        Ok(ranked)
    }

    /// Flip a location's status. Inactive locations drop out of proximity
    /// results without losing their row.
    pub fn set_location_status(&self, location_id: i64, status: &str) -> Result<bool> {
        let exists: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM clinic_locations WHERE id = ?",
                [location_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(false);
        }
        self.conn().execute(
            "UPDATE clinic_locations SET status = ? WHERE id = ?",
            params![status, location_id],
        )?;
        Ok(true)
    }
}

/// Link for hand-off to an external map application.
pub fn maps_link(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps?q={lat},{lon}")
}
