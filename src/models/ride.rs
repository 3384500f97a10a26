use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::{DriverSummary, GeoPoint, Tier};
use crate::models::rider::Rider;
use crate::models::trip::TripDetails;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Requested,
    Assigned,
}

impl RideStatus {
    /// Rides move forward only: once assigned they are never reopened.
    pub fn is_assignable(&self) -> bool {
        match self {
            RideStatus::Requested => true,
            RideStatus::Assigned => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub tier: Tier,
    pub status: RideStatus,
    pub driver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn new(rider_id: Uuid, pickup: GeoPoint, destination: GeoPoint, tier: Tier) -> Self {
        Self {
            id: Uuid::new_v4(),
            rider_id,
            pickup,
            destination,
            tier,
            status: RideStatus::Requested,
            driver_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Input to ride creation once the boundary has validated coordinates.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub rider_id: Uuid,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub tier: Tier,
    pub auto_assign: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRideOutcome {
    pub ride_id: Uuid,
    pub status: RideStatus,
    pub trip_id: Option<Uuid>,
    pub driver: Option<DriverSummary>,
    pub message: Option<String>,
}

/// Full read model of a ride: the request plus whoever and whatever hangs
/// off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideDetails {
    pub id: Uuid,
    pub status: RideStatus,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub tier: Tier,
    pub rider: Option<Rider>,
    pub driver: Option<DriverSummary>,
    pub trip: Option<TripDetails>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyRide {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub tier: Tier,
    pub distance_km: f64,
    pub created_at: DateTime<Utc>,
}
