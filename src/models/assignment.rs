use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of a committed driver/ride pairing and the trip it opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub trip_id: Uuid,
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub rider_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}
