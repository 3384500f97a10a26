use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::ResourceCache;
use crate::error::AppError;
use crate::models::assignment::Assignment;
use crate::models::driver::DriverStatus;
use crate::models::ride::RideStatus;
use crate::models::trip::Trip;
use crate::store::{RowKey, Store};

/// Pairs a driver with a ride and opens the trip, all in one transaction.
///
/// Both rows are locked before either is read, so of two racing attempts on
/// the same driver or the same ride only the first to lock can pass its
/// checks; the other sees the committed state and gets a conflict.
pub async fn assign(
    store: &Store,
    cache: &dyn ResourceCache,
    driver_id: Uuid,
    ride_id: Uuid,
) -> Result<Assignment, AppError> {
    let mut tx = store
        .begin([RowKey::Driver(driver_id), RowKey::Ride(ride_id)])
        .await;

    let mut driver = tx
        .driver(driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
    if !driver.is_available() {
        return Err(AppError::Conflict(format!(
            "driver {driver_id} is no longer available"
        )));
    }

    let mut ride = tx
        .ride(ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;
    if !ride.status.is_assignable() {
        return Err(AppError::Conflict(format!(
            "ride {ride_id} is no longer assignable"
        )));
    }

    let assigned_at = Utc::now();
    let trip = Trip::new(ride.id, driver.id, ride.rider_id);
    let assignment = Assignment {
        trip_id: trip.id,
        ride_id,
        driver_id,
        rider_id: ride.rider_id,
        assigned_at,
    };

    driver.status = DriverStatus::Assigned;
    driver.updated_at = assigned_at;
    ride.status = RideStatus::Assigned;
    ride.driver_id = Some(driver_id);

    tx.update_driver(driver)?;
    tx.update_ride(ride)?;
    tx.insert_trip(trip)?;
    tx.commit().await;

    if let Err(err) = cache.remove(driver_id).await {
        warn!(error = %err, driver_id = %driver_id, "failed to drop assigned driver from cache");
    }

    info!(
        ride_id = %ride_id,
        driver_id = %driver_id,
        trip_id = %assignment.trip_id,
        "ride assigned"
    );

    Ok(assignment)
}
