use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::assignment::assign;
use crate::engine::matching::find_nearest_available;
use crate::error::AppError;
use crate::models::driver::DriverSummary;
use crate::models::ride::{CreateRideOutcome, NewRide, RideDetails, RideRequest, RideStatus};
use crate::models::trip::TripDetails;
use crate::state::AppState;

/// Persists a ride request and, when asked, tries to hand it straight to the
/// nearest available driver. Without a match the ride stays REQUESTED for a
/// driver to accept manually.
///
/// The ride is visible to drivers before matching finishes, so a manual
/// accept can beat the auto path; the outcome then reflects that assignment.
pub async fn create_ride(state: &AppState, new_ride: NewRide) -> Result<CreateRideOutcome, AppError> {
    let rider = state.store.rider(new_ride.rider_id).ok_or_else(|| {
        AppError::NotFound(format!("rider {} not found", new_ride.rider_id))
    })?;

    let ride = RideRequest::new(
        rider.id,
        new_ride.pickup,
        new_ride.destination,
        new_ride.tier,
    );
    let ride_id = ride.id;
    state.store.insert_ride(ride);

    if !new_ride.auto_assign {
        info!(ride_id = %ride_id, tier = new_ride.tier.as_str(), "ride requested");
        return Ok(queued(state, ride_id, "Ride requested. Waiting for a driver to accept."));
    }

    let start = Instant::now();
    let matched = find_nearest_available(
        &state.store,
        state.cache.as_ref(),
        &new_ride.pickup,
        new_ride.tier,
    )
    .await;
    let source = matched.map_or("none", |found| found.source.as_str());
    state
        .metrics
        .matching_latency_seconds
        .with_label_values(&[source])
        .observe(start.elapsed().as_secs_f64());

    let Some(matched) = matched else {
        info!(ride_id = %ride_id, tier = new_ride.tier.as_str(), "no drivers available; ride queued");
        return Ok(queued(state, ride_id, "No drivers available. Your request is queued."));
    };

    let start = Instant::now();
    let result = assign(&state.store, state.cache.as_ref(), matched.driver_id, ride_id).await;
    state
        .metrics
        .assignment_duration_seconds
        .with_label_values(&["auto"])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(assignment) => {
            state
                .metrics
                .assignments_total
                .with_label_values(&["auto", "success"])
                .inc();

            let driver = state
                .store
                .driver(assignment.driver_id)
                .map(|driver| DriverSummary::from(&driver));
            Ok(assigned(state, ride_id, assignment.trip_id, driver))
        }
        Err(err) if err.is_conflict() => {
            state
                .metrics
                .assignments_total
                .with_label_values(&["auto", "conflict"])
                .inc();
            warn!(
                ride_id = %ride_id,
                driver_id = %matched.driver_id,
                error = %err,
                "auto-assignment lost a race"
            );
            settled_after_conflict(state, ride_id).await
        }
        Err(err) => Err(err),
    }
}

/// Reports whatever the ride ended up as after a lost race. A driver may have
/// accepted it by hand in the meantime; otherwise it is still waiting.
async fn settled_after_conflict(
    state: &AppState,
    ride_id: Uuid,
) -> Result<CreateRideOutcome, AppError> {
    let snapshot = state
        .store
        .ride_snapshot(ride_id)
        .await
        .ok_or_else(|| AppError::Internal(format!("ride {ride_id} vanished after creation")))?;

    match (snapshot.ride.status, snapshot.trip) {
        (RideStatus::Assigned, Some(trip)) => {
            let driver = snapshot.driver.as_ref().map(DriverSummary::from);
            Ok(assigned(state, ride_id, trip.id, driver))
        }
        _ => Ok(queued(state, ride_id, "No drivers available. Your request is queued.")),
    }
}

pub async fn get_ride(state: &AppState, ride_id: Uuid) -> Result<RideDetails, AppError> {
    let snapshot = state
        .store
        .ride_snapshot(ride_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;

    let ride = snapshot.ride;
    Ok(RideDetails {
        id: ride.id,
        status: ride.status,
        pickup: ride.pickup,
        destination: ride.destination,
        tier: ride.tier,
        rider: snapshot.rider,
        driver: snapshot.driver.as_ref().map(DriverSummary::from),
        trip: snapshot
            .trip
            .map(|trip| TripDetails::new(trip, snapshot.payment)),
        created_at: ride.created_at,
    })
}

fn assigned(
    state: &AppState,
    ride_id: Uuid,
    trip_id: Uuid,
    driver: Option<DriverSummary>,
) -> CreateRideOutcome {
    state
        .metrics
        .rides_created_total
        .with_label_values(&["assigned"])
        .inc();

    CreateRideOutcome {
        ride_id,
        status: RideStatus::Assigned,
        trip_id: Some(trip_id),
        driver,
        message: None,
    }
}

fn queued(state: &AppState, ride_id: Uuid, message: &str) -> CreateRideOutcome {
    state
        .metrics
        .rides_created_total
        .with_label_values(&["queued"])
        .inc();

    CreateRideOutcome {
        ride_id,
        status: RideStatus::Requested,
        trip_id: None,
        driver: None,
        message: Some(message.to_string()),
    }
}
