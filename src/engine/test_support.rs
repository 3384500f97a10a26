use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;
use uuid::Uuid;

use crate::cache::{CacheError, CachedDriver, MemoryResourceCache, ResourceCache};
use crate::models::driver::{Driver, GeoPoint, Tier};
use crate::models::ride::RideRequest;
use crate::models::rider::Rider;
use crate::store::Store;

/// Cache whose backend is permanently down.
pub struct UnavailableCache;

#[async_trait]
impl ResourceCache for UnavailableCache {
    async fn put(&self, _: Uuid, _: GeoPoint, _: Tier) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn remove(&self, _: Uuid) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn find_candidates(&self, _: Tier) -> Result<Vec<CachedDriver>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

pub fn point(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint { lat, lng }
}

pub struct Fixture {
    pub store: Arc<Store>,
    pub cache: Arc<MemoryResourceCache>,
    pub rider: Rider,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(Store::new());
        let rider = Rider::new("Alice Johnson", "+1234567890", "alice@example.com");
        store.insert_rider(rider.clone());

        Self {
            store,
            cache: Arc::new(MemoryResourceCache::new(Duration::from_secs(3_600))),
            rider,
        }
    }

    /// Available driver known to both the store and the cache.
    pub async fn driver(&self, tier: Tier, lat: f64, lng: f64) -> Driver {
        let driver = self.store_only_driver(tier, lat, lng);
        self.cache
            .put(driver.id, point(lat, lng), tier)
            .await
            .unwrap();
        driver
    }

    /// Available driver the cache has never heard of.
    pub fn store_only_driver(&self, tier: Tier, lat: f64, lng: f64) -> Driver {
        let driver = Driver::new("Test Driver", "+1111111111", tier).at(lat, lng);
        self.store.insert_driver(driver.clone());
        driver
    }

    pub fn ride(&self, tier: Tier, pickup: GeoPoint, destination: GeoPoint) -> RideRequest {
        let ride = RideRequest::new(self.rider.id, pickup, destination, tier);
        self.store.insert_ride(ride.clone());
        ride
    }

    pub fn ride_at(&self, tier: Tier, lat: f64, lng: f64) -> RideRequest {
        self.ride(tier, point(lat, lng), point(lat + 0.03, lng + 0.03))
    }
}
