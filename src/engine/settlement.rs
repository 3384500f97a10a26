use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::ResourceCache;
use crate::error::AppError;
use crate::geo::planar_km;
use crate::models::driver::{DriverStatus, GeoPoint, Tier};
use crate::models::trip::{Trip, TripSettlement, TripStatus};
use crate::store::{RowKey, Store};

/// Fare per distance unit, per tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareRates {
    pub economy: f64,
    pub premium: f64,
}

impl FareRates {
    pub fn rate_for(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Economy => self.economy,
            Tier::Premium => self.premium,
        }
    }

    /// Trip distance and fare, both rounded to two decimals. The fare is
    /// computed from the already-rounded distance.
    pub fn quote(&self, pickup: &GeoPoint, destination: &GeoPoint, tier: Tier) -> (f64, f64) {
        let distance = round_cents(planar_km(pickup, destination));
        let fare = round_cents(distance * self.rate_for(tier));
        (distance, fare)
    }
}

impl Default for FareRates {
    fn default() -> Self {
        Self {
            economy: 1.0,
            premium: 2.0,
        }
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub async fn start_trip(store: &Store, trip_id: Uuid) -> Result<Trip, AppError> {
    let mut tx = store.begin([RowKey::Trip(trip_id)]).await;

    let mut trip = tx
        .trip(trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;
    if !trip.status.can_start() {
        return Err(AppError::Conflict(format!(
            "trip {trip_id} cannot start from {:?}",
            trip.status
        )));
    }

    trip.status = TripStatus::Started;
    trip.start_time = Some(Utc::now());
    tx.update_trip(trip.clone())?;
    tx.commit().await;

    info!(trip_id = %trip_id, "trip started");
    Ok(trip)
}

/// Ends a trip, fixes its distance and fare, and hands the driver back to the
/// available pool.
///
/// Distance and fare are written once; a second call is a conflict and leaves
/// them untouched.
pub async fn end_trip(
    store: &Store,
    cache: &dyn ResourceCache,
    rates: &FareRates,
    trip_id: Uuid,
) -> Result<TripSettlement, AppError> {
    // A trip's driver never changes, so it can be read before locking.
    let driver_id = store
        .trip(trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?
        .driver_id;

    let mut tx = store
        .begin([RowKey::Trip(trip_id), RowKey::Driver(driver_id)])
        .await;

    let mut trip = tx
        .trip(trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;
    if !trip.status.can_end() {
        return Err(AppError::Conflict(format!("trip {trip_id} already ended")));
    }

    let ride = tx.ride(trip.ride_request_id).ok_or_else(|| {
        AppError::Internal(format!("trip {trip_id} has no ride {}", trip.ride_request_id))
    })?;
    let mut driver = tx.driver(driver_id).ok_or_else(|| {
        AppError::Internal(format!("trip {trip_id} references missing driver {driver_id}"))
    })?;

    let (distance, fare) = rates.quote(&ride.pickup, &ride.destination, ride.tier);
    let ended_at = Utc::now();

    trip.status = TripStatus::Ended;
    trip.end_time = Some(ended_at);
    trip.distance = Some(distance);
    trip.fare = Some(fare);

    driver.status = DriverStatus::Available;
    driver.updated_at = ended_at;
    let republish = driver.location.map(|location| (location, driver.tier));

    tx.update_trip(trip.clone())?;
    tx.update_driver(driver)?;
    tx.commit().await;

    if let Some((location, tier)) = republish {
        if let Err(err) = cache.put(driver_id, location, tier).await {
            warn!(error = %err, driver_id = %driver_id, "failed to republish released driver");
        }
    }

    info!(trip_id = %trip_id, distance, fare, "trip ended");

    Ok(TripSettlement {
        id: trip.id,
        status: trip.status,
        start_time: trip.start_time,
        end_time: trip.end_time,
        distance,
        fare,
    })
}
