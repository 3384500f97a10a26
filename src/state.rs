use std::sync::Arc;

use tokio::time::Duration;

use crate::cache::{MemoryResourceCache, ResourceCache};
use crate::config::Config;
use crate::engine::payment::{PaymentProcessor, SimulatedProcessor};
use crate::engine::settlement::FareRates;
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Handles every operation needs, built once at start-up and shared.
pub struct AppState {
    pub store: Arc<Store>,
    pub cache: Arc<dyn ResourceCache>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub fare_rates: FareRates,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        cache: Arc<dyn ResourceCache>,
        payments: Arc<dyn PaymentProcessor>,
        fare_rates: FareRates,
    ) -> Self {
        Self::with_store(Arc::new(Store::new()), cache, payments, fare_rates)
    }

    /// Builds state around an existing store handle, shared with the caller.
    pub fn with_store(
        store: Arc<Store>,
        cache: Arc<dyn ResourceCache>,
        payments: Arc<dyn PaymentProcessor>,
        fare_rates: FareRates,
    ) -> Self {
        Self {
            store,
            cache,
            payments,
            fare_rates,
            metrics: Metrics::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(MemoryResourceCache::new(Duration::from_secs(
                config.driver_cache_ttl_secs,
            ))),
            Arc::new(SimulatedProcessor::new(config.payment_success_rate)),
            config.fare_rates,
        )
    }
}
