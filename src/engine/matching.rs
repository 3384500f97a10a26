use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::ResourceCache;
use crate::geo::planar_km;
use crate::models::driver::{GeoPoint, Tier};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Cache,
    Store,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::Cache => "cache",
            MatchSource::Store => "store",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverMatch {
    pub driver_id: Uuid,
    pub distance_km: f64,
    pub source: MatchSource,
}

/// Nearest AVAILABLE driver of `tier` to `origin`, or `None`.
///
/// The cache is tried first. Its best candidate is re-read from the store and
/// only returned if still available; otherwise the whole cache answer is
/// dropped and the store is scanned instead.
pub async fn find_nearest_available(
    store: &Store,
    cache: &dyn ResourceCache,
    origin: &GeoPoint,
    tier: Tier,
) -> Option<DriverMatch> {
    if let Some(found) = nearest_from_cache(store, cache, origin, tier).await {
        return Some(found);
    }

    nearest_from_store(store, origin, tier)
}

async fn nearest_from_cache(
    store: &Store,
    cache: &dyn ResourceCache,
    origin: &GeoPoint,
    tier: Tier,
) -> Option<DriverMatch> {
    let candidates = match cache.find_candidates(tier).await {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(error = %err, tier = tier.as_str(), "cache lookup failed; scanning store");
            return None;
        }
    };

    let (candidate, distance_km) = nearest(
        candidates
            .iter()
            .map(|candidate| (candidate, planar_km(origin, &candidate.location))),
    )?;

    let still_available = store
        .driver(candidate.driver_id)
        .is_some_and(|driver| driver.is_available() && driver.tier == tier);

    if !still_available {
        debug!(driver_id = %candidate.driver_id, "discarding stale cache entry");
        if let Err(err) = cache.remove(candidate.driver_id).await {
            warn!(error = %err, driver_id = %candidate.driver_id, "failed to evict stale cache entry");
        }
        return None;
    }

    Some(DriverMatch {
        driver_id: candidate.driver_id,
        distance_km,
        source: MatchSource::Cache,
    })
}

fn nearest_from_store(store: &Store, origin: &GeoPoint, tier: Tier) -> Option<DriverMatch> {
    let drivers = store.available_drivers(tier);

    let (driver, distance_km) = nearest(drivers.iter().filter_map(|driver| {
        let location = driver.location.as_ref()?;
        Some((driver, planar_km(origin, location)))
    }))?;

    Some(DriverMatch {
        driver_id: driver.id,
        distance_km,
        source: MatchSource::Store,
    })
}

/// Minimum by distance; on a tie the earliest item wins.
fn nearest<T>(scored: impl Iterator<Item = (T, f64)>) -> Option<(T, f64)> {
    scored.min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{MatchSource, find_nearest_available, nearest};
    use crate::cache::ResourceCache;
    use crate::engine::test_support::{Fixture, UnavailableCache, point};
    use crate::models::driver::{Driver, DriverStatus, Tier};

    #[test]
    fn nearest_prefers_first_seen_on_ties() {
        let scored = vec![("a", 2.0), ("b", 1.0), ("c", 1.0), ("d", 3.0)];
        assert_eq!(nearest(scored.into_iter()), Some(("b", 1.0)));
    }

    #[tokio::test]
    async fn picks_nearest_cached_driver() {
        let fx = Fixture::new();
        let _far = fx.driver(Tier::Economy, 37.90, -122.30).await;
        let near = fx.driver(Tier::Economy, 37.771, -122.421).await;
        let _mid = fx.driver(Tier::Economy, 37.80, -122.40).await;

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await
        .unwrap();

        assert_eq!(found.driver_id, near.id);
        assert_eq!(found.source, MatchSource::Cache);
    }

    #[tokio::test]
    async fn never_returns_a_driver_of_another_tier() {
        let fx = Fixture::new();
        let premium_close = fx.driver(Tier::Premium, 37.77, -122.42).await;
        let economy_far = fx.driver(Tier::Economy, 37.90, -122.30).await;

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await
        .unwrap();
        assert_eq!(found.driver_id, economy_far.id);

        let premium = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.90, -122.30),
            Tier::Premium,
        )
        .await
        .unwrap();
        assert_eq!(premium.driver_id, premium_close.id);
    }

    #[tokio::test]
    async fn falls_back_to_store_on_cold_cache() {
        let fx = Fixture::new();
        let near = fx.store_only_driver(Tier::Economy, 37.771, -122.421);
        let _far = fx.store_only_driver(Tier::Economy, 37.85, -122.35);

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await
        .unwrap();

        assert_eq!(found.driver_id, near.id);
        assert_eq!(found.source, MatchSource::Store);
    }

    #[tokio::test]
    async fn stale_cache_entry_is_rejected_and_evicted() {
        let fx = Fixture::new();
        let stale = fx.driver(Tier::Economy, 37.77, -122.42).await;
        let mut row = fx.store.driver(stale.id).unwrap();
        row.status = DriverStatus::Assigned;
        fx.store.insert_driver(row);

        let fallback = fx.store_only_driver(Tier::Economy, 37.80, -122.40);

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await
        .unwrap();

        assert_eq!(found.driver_id, fallback.id);
        assert_eq!(found.source, MatchSource::Store);
        assert!(fx.cache.find_candidates(Tier::Economy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_result_does_not_fall_through_to_next_cache_entry() {
        let fx = Fixture::new();
        let origin = point(37.77, -122.42);

        let stale = fx.driver(Tier::Economy, 37.77, -122.42).await;
        let mut row = fx.store.driver(stale.id).unwrap();
        row.status = DriverStatus::Assigned;
        fx.store.insert_driver(row);

        // Cached close to the origin, but the store knows it has moved away.
        let moved = fx.driver(Tier::Economy, 37.771, -122.421).await;
        let mut row = fx.store.driver(moved.id).unwrap();
        row.location = Some(point(38.5, -121.5));
        fx.store.insert_driver(row);

        let truly_nearest = fx.store_only_driver(Tier::Economy, 37.80, -122.40);

        let found = find_nearest_available(&fx.store, fx.cache.as_ref(), &origin, Tier::Economy)
            .await
            .unwrap();

        assert_eq!(found.driver_id, truly_nearest.id);
        assert_eq!(found.source, MatchSource::Store);
    }

    #[tokio::test]
    async fn unavailable_cache_degrades_to_store_scan() {
        let fx = Fixture::new();
        let driver = fx.store_only_driver(Tier::Premium, 37.77, -122.42);

        let found = find_nearest_available(
            &fx.store,
            &UnavailableCache,
            &point(37.78, -122.41),
            Tier::Premium,
        )
        .await
        .unwrap();

        assert_eq!(found.driver_id, driver.id);
        assert_eq!(found.source, MatchSource::Store);
    }

    #[tokio::test]
    async fn drivers_without_location_are_never_matched() {
        let fx = Fixture::new();
        fx.store
            .insert_driver(Driver::new("Nowhere", "+1", Tier::Economy));

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await;

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn store_scan_breaks_ties_by_driver_id() {
        let fx = Fixture::new();
        let mut high = Driver::new("High", "+1", Tier::Economy).at(37.8, -122.4);
        high.id = Uuid::from_u128(9);
        let mut low = Driver::new("Low", "+2", Tier::Economy).at(37.8, -122.4);
        low.id = Uuid::from_u128(3);
        fx.store.insert_driver(high);
        fx.store.insert_driver(low);

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Economy,
        )
        .await
        .unwrap();

        assert_eq!(found.driver_id, Uuid::from_u128(3));
    }

    #[tokio::test]
    async fn no_available_driver_means_no_match() {
        let fx = Fixture::new();
        let busy = fx.store_only_driver(Tier::Premium, 37.77, -122.42);
        let mut row = fx.store.driver(busy.id).unwrap();
        row.status = DriverStatus::Assigned;
        fx.store.insert_driver(row);

        let found = find_nearest_available(
            &fx.store,
            fx.cache.as_ref(),
            &point(37.77, -122.42),
            Tier::Premium,
        )
        .await;

        assert!(found.is_none());
    }
}
