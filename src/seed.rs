//! Demo fixtures: a handful of riders and drivers around San Francisco.

use tracing::{info, warn};

use crate::models::driver::{Driver, Tier};
use crate::models::rider::Rider;
use crate::state::AppState;

const RIDERS: [(&str, &str, &str); 3] = [
    ("Alice Johnson", "+1234567890", "alice@example.com"),
    ("Bob Smith", "+1234567891", "bob@example.com"),
    ("Charlie Brown", "+1234567892", "charlie@example.com"),
];

const DRIVERS: [(&str, &str, Tier, f64, f64); 10] = [
    ("David Wilson", "+1111111111", Tier::Economy, 37.7749, -122.4194),
    ("Emma Davis", "+1111111112", Tier::Economy, 37.7849, -122.4094),
    ("Frank Miller", "+1111111113", Tier::Premium, 37.7649, -122.4294),
    ("Grace Lee", "+1111111114", Tier::Premium, 37.7949, -122.3994),
    ("Henry Taylor", "+1111111115", Tier::Economy, 37.7549, -122.4394),
    ("Ivy Anderson", "+1111111116", Tier::Economy, 37.8049, -122.3894),
    ("Jack Thomas", "+1111111117", Tier::Premium, 37.7449, -122.4494),
    ("Kelly White", "+1111111118", Tier::Economy, 37.8149, -122.3794),
    ("Liam Harris", "+1111111119", Tier::Premium, 37.7349, -122.4594),
    ("Mia Martin", "+1111111120", Tier::Economy, 37.8249, -122.3694),
];

/// Inserts the demo riders and drivers and publishes every available driver
/// to the cache.
pub async fn seed_demo_data(state: &AppState) {
    for (name, phone, email) in RIDERS {
        state.store.insert_rider(Rider::new(name, phone, email));
    }

    for (name, phone, tier, lat, lng) in DRIVERS {
        let driver = Driver::new(name, phone, tier).at(lat, lng);
        state.store.insert_driver(driver.clone());

        if let Some(location) = driver.location {
            if let Err(err) = state.cache.put(driver.id, location, driver.tier).await {
                warn!(error = %err, driver_id = %driver.id, "failed to cache seeded driver");
            }
        }
    }

    info!(
        riders = RIDERS.len(),
        drivers = DRIVERS.len(),
        "demo data seeded"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::seed_demo_data;
    use crate::cache::MemoryResourceCache;
    use crate::engine::payment::SimulatedProcessor;
    use crate::engine::settlement::FareRates;
    use crate::models::driver::Tier;
    use crate::state::AppState;

    #[tokio::test]
    async fn seeds_riders_drivers_and_cache() {
        let cache = Arc::new(MemoryResourceCache::new(tokio::time::Duration::from_secs(3_600)));
        let state = AppState::new(
            cache.clone(),
            Arc::new(SimulatedProcessor::new(1.0)),
            FareRates::default(),
        );

        seed_demo_data(&state).await;

        let counts = state.store.counts();
        assert_eq!(counts.riders, 3);
        assert_eq!(counts.drivers, 10);
        assert_eq!(cache.len(), 10);
        assert_eq!(state.store.available_drivers(Tier::Premium).len(), 4);
    }
}
