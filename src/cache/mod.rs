//! Resource cache: a fast, best-effort index of available drivers per tier.
//!
//! Nothing here is authoritative. Entries expire after a TTL, may outlive the
//! driver's availability, and any backend failure is surfaced as a
//! [`CacheError`] that callers log and treat as "no candidates".

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::{GeoPoint, Tier};

pub use memory::MemoryResourceCache;

/// One hour, after which an entry is presumed stale.
pub const DEFAULT_DRIVER_TTL_SECS: u64 = 3_600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedDriver {
    pub driver_id: Uuid,
    pub location: GeoPoint,
    pub tier: Tier,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// Upserts the driver's entry for `tier` and refreshes its TTL.
    async fn put(&self, driver_id: Uuid, location: GeoPoint, tier: Tier) -> Result<(), CacheError>;

    /// Drops the driver from every tier.
    async fn remove(&self, driver_id: Uuid) -> Result<(), CacheError>;

    /// Live entries for `tier`, oldest first. Empty on a cold or evicted cache.
    async fn find_candidates(&self, tier: Tier) -> Result<Vec<CachedDriver>, CacheError>;
}

pub(crate) fn cache_key(tier: Tier, driver_id: Uuid) -> String {
    format!("driver:{}:{driver_id}", tier.as_str())
}
