use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Service level a driver offers and a rider asks for. A driver is only ever
/// matched to rides of its own tier.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    Economy,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Economy, Tier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Economy => "ECONOMY",
            Tier::Premium => "PREMIUM",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
    Assigned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub status: DriverStatus,
    pub tier: Tier,
    pub location: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, tier: Tier) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            status: DriverStatus::Available,
            tier,
            location: None,
            updated_at: Utc::now(),
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(GeoPoint { lat, lng });
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }

    /// Available drivers with a known position are the only ones matching
    /// may hand out.
    pub fn is_matchable(&self, tier: Tier) -> bool {
        self.is_available() && self.tier == tier && self.location.is_some()
    }
}

/// Contact card embedded in ride responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub location: Option<GeoPoint>,
}

impl From<&Driver> for DriverSummary {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            location: driver.location,
        }
    }
}
