use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::payment::Payment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Created,
    Started,
    Ended,
    Paid,
}

impl TripStatus {
    pub fn can_start(&self) -> bool {
        matches!(self, TripStatus::Created)
    }

    pub fn can_end(&self) -> bool {
        match self {
            TripStatus::Created | TripStatus::Started => true,
            TripStatus::Ended | TripStatus::Paid => false,
        }
    }

    pub fn can_pay(&self) -> bool {
        match self {
            TripStatus::Ended => true,
            TripStatus::Created | TripStatus::Started | TripStatus::Paid => false,
        }
    }

    /// Whether the trip still holds its driver.
    pub fn is_active(&self) -> bool {
        self.can_end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub ride_request_id: Uuid,
    pub driver_id: Uuid,
    pub rider_id: Uuid,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
    pub fare: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(ride_request_id: Uuid, driver_id: Uuid, rider_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_request_id,
            driver_id,
            rider_id,
            status: TripStatus::Created,
            start_time: None,
            end_time: None,
            distance: None,
            fare: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSettlement {
    pub id: Uuid,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance: f64,
    pub fare: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDetails {
    pub id: Uuid,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
    pub fare: Option<f64>,
    pub payment: Option<Payment>,
}

impl TripDetails {
    pub fn new(trip: Trip, payment: Option<Payment>) -> Self {
        Self {
            id: trip.id,
            status: trip.status,
            start_time: trip.start_time,
            end_time: trip.end_time,
            distance: trip.distance,
            fare: trip.fare,
            payment,
        }
    }
}
