use anyhow::Result;

use crate::db::{maps_link, Database, NearbyQuery};

pub fn run_centers(db: &Database, lat: f64, lon: f64, limit: usize, max_km: f64) -> Result<()> {
    let results = db.nearby_centers(lat, lon, NearbyQuery { limit, max_km })?;

    if results.is_empty() {
        println!("No centers within {max_km} km of ({lat}, {lon}).");
        return Ok(());
    }

    for (i, center) in results.iter().enumerate() {
        println!(
            "{}. {} [{}] — {}",
            i + 1,
            center.unit.name,
            center.unit.kind,
            format_km(center.distance_km)
        );
        if !center.unit.address.is_empty() {
            println!("   {}", center.unit.address);
        }
        if !center.unit.phone.is_empty() {
            println!("   {}", center.unit.phone);
        }
        if !center.location.label.is_empty() {
            println!("   {}", center.location.label);
        }
        println!("   {}", maps_link(center.location.lat, center.location.lon));
    }

    Ok(())
}

/// Short distances keep a decimal so nearby results stay distinguishable.
fn format_km(km: f64) -> String {
    if km < 10.0 {
        format!("{km:.1} km")
    } else {
        format!("{km:.0} km")
    }
}
