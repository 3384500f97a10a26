use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheError, CachedDriver, ResourceCache, cache_key};
use crate::models::driver::{GeoPoint, Tier};

#[derive(Debug, Clone)]
struct Entry {
    driver: CachedDriver,
    inserted_seq: u64,
    expires_at: Instant,
}

/// In-process key/value cache with per-key expiry.
///
/// Keys follow `driver:<TIER>:<id>`. Expired entries are skipped on read and
/// evicted lazily.
pub struct MemoryResourceCache {
    entries: DashMap<String, Entry>,
    next_seq: AtomicU64,
    ttl: Duration,
}

impl MemoryResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResourceCache for MemoryResourceCache {
    async fn put(&self, driver_id: Uuid, location: GeoPoint, tier: Tier) -> Result<(), CacheError> {
        let key = cache_key(tier, driver_id);
        let expires_at = Instant::now() + self.ttl;
        let driver = CachedDriver {
            driver_id,
            location,
            tier,
        };

        // A refresh keeps the original position in candidate order.
        let seq = match self.entries.get(&key) {
            Some(existing) if existing.expires_at > Instant::now() => existing.inserted_seq,
            _ => self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        self.entries.insert(
            key,
            Entry {
                driver,
                inserted_seq: seq,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, driver_id: Uuid) -> Result<(), CacheError> {
        for tier in Tier::ALL {
            self.entries.remove(&cache_key(tier, driver_id));
        }
        Ok(())
    }

    async fn find_candidates(&self, tier: Tier) -> Result<Vec<CachedDriver>, CacheError> {
        let now = Instant::now();
        let prefix = format!("driver:{}:", tier.as_str());

        let mut live = Vec::new();
        let mut expired = Vec::new();
        for entry in self.entries.iter() {
            if !entry.key().starts_with(&prefix) {
                continue;
            }
            if entry.value().expires_at <= now {
                expired.push(entry.key().clone());
            } else {
                live.push(entry.value().clone());
            }
        }

        for key in &expired {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        if !expired.is_empty() {
            debug!(evicted = expired.len(), tier = tier.as_str(), "evicted expired cache entries");
        }

        live.sort_by_key(|entry| entry.inserted_seq);
        Ok(live.into_iter().map(|entry| entry.driver).collect())
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{Duration, advance};
    use uuid::Uuid;

    use super::MemoryResourceCache;
    use crate::cache::ResourceCache;
    use crate::models::driver::{GeoPoint, Tier};

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    #[tokio::test]
    async fn candidates_are_scoped_to_tier_in_put_order() {
        let cache = MemoryResourceCache::new(Duration::from_secs(3_600));
        let first = Uuid::from_u128(2);
        let second = Uuid::from_u128(1);
        let premium = Uuid::from_u128(3);

        cache.put(first, point(37.0, -122.0), Tier::Economy).await.unwrap();
        cache.put(second, point(37.1, -122.1), Tier::Economy).await.unwrap();
        cache.put(premium, point(37.2, -122.2), Tier::Premium).await.unwrap();

        let economy = cache.find_candidates(Tier::Economy).await.unwrap();
        let ids: Vec<Uuid> = economy.iter().map(|c| c.driver_id).collect();
        assert_eq!(ids, vec![first, second]);

        let premium_only = cache.find_candidates(Tier::Premium).await.unwrap();
        assert_eq!(premium_only.len(), 1);
        assert_eq!(premium_only[0].driver_id, premium);
    }

    #[tokio::test]
    async fn put_overwrites_location() {
        let cache = MemoryResourceCache::new(Duration::from_secs(3_600));
        let id = Uuid::new_v4();

        cache.put(id, point(37.0, -122.0), Tier::Economy).await.unwrap();
        cache.put(id, point(38.0, -121.0), Tier::Economy).await.unwrap();

        let candidates = cache.find_candidates(Tier::Economy).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].location, point(38.0, -121.0));
    }

    #[tokio::test]
    async fn remove_clears_every_tier() {
        let cache = MemoryResourceCache::new(Duration::from_secs(3_600));
        let id = Uuid::new_v4();

        cache.put(id, point(37.0, -122.0), Tier::Economy).await.unwrap();
        cache.put(id, point(37.0, -122.0), Tier::Premium).await.unwrap();
        cache.remove(id).await.unwrap();

        assert!(cache.find_candidates(Tier::Economy).await.unwrap().is_empty());
        assert!(cache.find_candidates(Tier::Premium).await.unwrap().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryResourceCache::new(Duration::from_secs(3_600));
        let id = Uuid::new_v4();
        cache.put(id, point(37.0, -122.0), Tier::Economy).await.unwrap();

        advance(Duration::from_secs(3_599)).await;
        assert_eq!(cache.find_candidates(Tier::Economy).await.unwrap().len(), 1);

        advance(Duration::from_secs(2)).await;
        assert!(cache.find_candidates(Tier::Economy).await.unwrap().is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn put_refreshes_ttl() {
        let cache = MemoryResourceCache::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        cache.put(id, point(37.0, -122.0), Tier::Economy).await.unwrap();

        advance(Duration::from_secs(45)).await;
        cache.put(id, point(37.0, -122.0), Tier::Economy).await.unwrap();
        advance(Duration::from_secs(45)).await;

        assert_eq!(cache.find_candidates(Tier::Economy).await.unwrap().len(), 1);
    }
}
