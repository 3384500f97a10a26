use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::assignment::assign;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::assignment::Assignment;
use crate::models::driver::{Driver, GeoPoint};
use crate::models::ride::NearbyRide;
use crate::state::AppState;
use crate::store::RowKey;

pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// Records a driver's position. Available drivers are (re)published to the
/// cache so matching can find them.
pub async fn update_location(
    state: &AppState,
    driver_id: Uuid,
    location: GeoPoint,
) -> Result<Driver, AppError> {
    let mut tx = state.store.begin([RowKey::Driver(driver_id)]).await;

    let mut driver = tx
        .driver(driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
    driver.location = Some(location);
    driver.updated_at = Utc::now();

    tx.update_driver(driver.clone())?;
    tx.commit().await;

    if driver.is_available() {
        if let Err(err) = state.cache.put(driver_id, location, driver.tier).await {
            warn!(error = %err, driver_id = %driver_id, "failed to cache driver location");
        }
    }

    info!(
        driver_id = %driver_id,
        lat = location.lat,
        lng = location.lng,
        "driver location updated"
    );

    Ok(driver)
}

/// A driver taking a waiting ride by hand.
pub async fn accept_ride(
    state: &AppState,
    driver_id: Uuid,
    ride_id: Uuid,
) -> Result<Assignment, AppError> {
    let start = Instant::now();
    let result = assign(&state.store, state.cache.as_ref(), driver_id, ride_id).await;
    state
        .metrics
        .assignment_duration_seconds
        .with_label_values(&["manual"])
        .observe(start.elapsed().as_secs_f64());

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) if err.is_conflict() => "conflict",
        Err(_) => "error",
    };
    state
        .metrics
        .assignments_total
        .with_label_values(&["manual", outcome])
        .inc();

    result
}

/// Waiting rides of the driver's tier whose pickup lies within `radius_km`,
/// nearest first.
pub fn nearby_rides(
    state: &AppState,
    driver_id: Uuid,
    radius_km: f64,
) -> Result<Vec<NearbyRide>, AppError> {
    let driver = state
        .store
        .driver(driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
    let position = driver.location.ok_or_else(|| {
        AppError::BadRequest(
            "driver location not set; update the location first".to_string(),
        )
    })?;

    let mut rides: Vec<NearbyRide> = state
        .store
        .requested_rides(driver.tier)
        .into_iter()
        .map(|ride| NearbyRide {
            distance_km: haversine_km(&position, &ride.pickup),
            id: ride.id,
            rider_id: ride.rider_id,
            pickup: ride.pickup,
            destination: ride.destination,
            tier: ride.tier,
            created_at: ride.created_at,
        })
        .filter(|ride| ride.distance_km <= radius_km)
        .collect();
    rides.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    info!(
        driver_id = %driver_id,
        radius_km,
        found = rides.len(),
        "nearby rides listed"
    );

    Ok(rides)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::{accept_ride, nearby_rides, update_location};
    use crate::cache::{MemoryResourceCache, ResourceCache};
    use crate::engine::payment::SimulatedProcessor;
    use crate::engine::settlement::FareRates;
    use crate::engine::test_support::point;
    use crate::error::AppError;
    use crate::models::driver::{Driver, DriverStatus, Tier};
    use crate::models::ride::{RideRequest, RideStatus};
    use crate::models::rider::Rider;
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryResourceCache::new(tokio::time::Duration::from_secs(3_600))),
            Arc::new(SimulatedProcessor::new(1.0)),
            FareRates::default(),
        )
    }

    fn requested_ride(state: &AppState, tier: Tier, lat: f64, lng: f64) -> RideRequest {
        let rider = Rider::new("Bob Smith", "+1234567891", "bob@example.com");
        let ride = RideRequest::new(rider.id, point(lat, lng), point(lat + 0.02, lng), tier);
        state.store.insert_rider(rider);
        state.store.insert_ride(ride.clone());
        ride
    }

    #[tokio::test]
    async fn location_update_publishes_available_driver() {
        let state = state();
        let driver = Driver::new("Emma Davis", "+1111111112", Tier::Premium);
        state.store.insert_driver(driver.clone());

        let updated = update_location(&state, driver.id, point(37.78, -122.41))
            .await
            .unwrap();

        assert_eq!(updated.location, Some(point(37.78, -122.41)));
        assert_eq!(
            state.store.driver(driver.id).unwrap().location,
            Some(point(37.78, -122.41))
        );
        let cached = state.cache.find_candidates(Tier::Premium).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].location, point(37.78, -122.41));
    }

    #[tokio::test]
    async fn location_update_of_assigned_driver_stays_out_of_cache() {
        let state = state();
        let mut driver = Driver::new("Ivy Anderson", "+1111111116", Tier::Economy);
        driver.status = DriverStatus::Assigned;
        state.store.insert_driver(driver.clone());

        update_location(&state, driver.id, point(37.80, -122.39))
            .await
            .unwrap();

        assert!(state.cache.find_candidates(Tier::Economy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn location_update_for_unknown_driver_is_not_found() {
        let state = state();
        let err = update_location(&state, Uuid::new_v4(), point(37.0, -122.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn manual_accept_assigns_waiting_ride() {
        let state = state();
        let driver = Driver::new("Frank Miller", "+1111111113", Tier::Economy).at(37.77, -122.42);
        state.store.insert_driver(driver.clone());
        let ride = requested_ride(&state, Tier::Economy, 37.77, -122.42);

        let assignment = accept_ride(&state, driver.id, ride.id).await.unwrap();

        assert_eq!(assignment.ride_id, ride.id);
        assert_eq!(state.store.ride(ride.id).unwrap().status, RideStatus::Assigned);

        let again = accept_ride(&state, driver.id, ride.id).await.unwrap_err();
        assert!(matches!(again, AppError::Conflict(_)));
    }

    #[test]
    fn nearby_rides_filters_tier_radius_and_sorts_nearest_first() {
        let state = state();
        let driver = Driver::new("Grace Lee", "+1111111114", Tier::Economy).at(37.77, -122.42);
        state.store.insert_driver(driver.clone());

        let far = requested_ride(&state, Tier::Economy, 37.80, -122.42);
        let near = requested_ride(&state, Tier::Economy, 37.771, -122.42);
        let _premium = requested_ride(&state, Tier::Premium, 37.77, -122.42);
        let _out_of_range = requested_ride(&state, Tier::Economy, 38.5, -122.42);

        let rides = nearby_rides(&state, driver.id, 10.0).unwrap();

        let ids: Vec<Uuid> = rides.iter().map(|ride| ride.id).collect();
        assert_eq!(ids, vec![near.id, far.id]);
        assert!(rides[0].distance_km < rides[1].distance_km);
    }

    #[test]
    fn nearby_rides_needs_a_known_location() {
        let state = state();
        let driver = Driver::new("Henry Taylor", "+1111111115", Tier::Economy);
        state.store.insert_driver(driver.clone());

        let err = nearby_rides(&state, driver.id, 10.0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let missing = nearby_rides(&state, Uuid::new_v4(), 10.0).unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
