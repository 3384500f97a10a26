//! Durable store: the single source of truth for riders, drivers, rides, trips
//! and payments.
//!
//! Rows live in `DashMap` tables. Multi-row writes go through a
//! [`Transaction`], which takes per-row locks up front (sorted, so two
//! transactions can never wait on each other in a cycle), stages its writes,
//! and applies them in one step on [`Transaction::commit`]. Dropping a
//! transaction without committing discards everything it staged.

mod transaction;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::driver::{Driver, Tier};
use crate::models::payment::Payment;
use crate::models::ride::{RideRequest, RideStatus};
use crate::models::rider::Rider;
use crate::models::trip::Trip;

pub use transaction::Transaction;
use transaction::RowGuard;

/// Lockable row. The derived ordering is the canonical lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Driver(Uuid),
    Ride(Uuid),
    Trip(Uuid),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Driver(id) => write!(f, "driver {id}"),
            RowKey::Ride(id) => write!(f, "ride {id}"),
            RowKey::Trip(id) => write!(f, "trip {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("{0} was written without holding its lock")]
    RowNotLocked(RowKey),
}

/// Everything hanging off one ride, read at a single commit boundary.
#[derive(Debug, Clone)]
pub struct RideSnapshot {
    pub ride: RideRequest,
    pub rider: Option<Rider>,
    pub driver: Option<Driver>,
    pub trip: Option<Trip>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCounts {
    pub riders: usize,
    pub drivers: usize,
    pub rides: usize,
    pub trips: usize,
    pub payments: usize,
}

/// In-process stand-in for the relational database. Engine functions borrow
/// it and `AppState` holds it as a shared `Arc` handle, so tests can build a
/// store up front and hand the same handle to fakes and to the state.
#[derive(Default)]
pub struct Store {
    riders: DashMap<Uuid, Rider>,
    drivers: DashMap<Uuid, Driver>,
    rides: DashMap<Uuid, RideRequest>,
    trips: DashMap<Uuid, Trip>,
    payments: DashMap<Uuid, Payment>,
    trip_by_ride: DashMap<Uuid, Uuid>,
    payment_by_trip: DashMap<Uuid, Uuid>,
    row_locks: DashMap<RowKey, Arc<Mutex<()>>>,
    commit_gate: RwLock<()>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_rider(&self, rider: Rider) {
        self.riders.insert(rider.id, rider);
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    /// Persists a brand-new ride. Rides are only ever mutated inside a
    /// transaction afterwards.
    pub fn insert_ride(&self, ride: RideRequest) {
        self.rides.insert(ride.id, ride);
    }

    pub fn rider(&self, id: Uuid) -> Option<Rider> {
        self.riders.get(&id).map(|entry| entry.value().clone())
    }

    pub fn driver(&self, id: Uuid) -> Option<Driver> {
        self.drivers.get(&id).map(|entry| entry.value().clone())
    }

    pub fn ride(&self, id: Uuid) -> Option<RideRequest> {
        self.rides.get(&id).map(|entry| entry.value().clone())
    }

    pub fn trip(&self, id: Uuid) -> Option<Trip> {
        self.trips.get(&id).map(|entry| entry.value().clone())
    }

    pub fn trip_for_ride(&self, ride_id: Uuid) -> Option<Trip> {
        let trip_id = *self.trip_by_ride.get(&ride_id)?.value();
        self.trip(trip_id)
    }

    pub fn payment_for_trip(&self, trip_id: Uuid) -> Option<Payment> {
        let payment_id = *self.payment_by_trip.get(&trip_id)?.value();
        self.payments.get(&payment_id).map(|entry| entry.value().clone())
    }

    pub fn riders(&self) -> Vec<Rider> {
        let mut riders: Vec<Rider> = self
            .riders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        riders.sort_by(|a, b| a.name.cmp(&b.name));
        riders
    }

    pub fn drivers(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        drivers
    }

    /// Drivers that are AVAILABLE, of `tier`, and have reported a location.
    /// Ordered by id so nearest-driver ties resolve the same way every time.
    pub fn available_drivers(&self, tier: Tier) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .filter(|entry| entry.value().is_matchable(tier))
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by_key(|driver| driver.id);
        drivers
    }

    pub fn requested_rides(&self, tier: Tier) -> Vec<RideRequest> {
        self.rides
            .iter()
            .filter(|entry| {
                let ride = entry.value();
                ride.status == RideStatus::Requested && ride.tier == tier
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Reads a ride and its linked rows without interleaving with a commit.
    pub async fn ride_snapshot(&self, ride_id: Uuid) -> Option<RideSnapshot> {
        let _gate = self.commit_gate.read().await;

        let ride = self.ride(ride_id)?;
        let rider = self.rider(ride.rider_id);
        let driver = ride.driver_id.and_then(|id| self.driver(id));
        let trip = self.trip_for_ride(ride.id);
        let payment = trip
            .as_ref()
            .and_then(|trip| self.payment_for_trip(trip.id));

        Some(RideSnapshot {
            ride,
            rider,
            driver,
            trip,
            payment,
        })
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            riders: self.riders.len(),
            drivers: self.drivers.len(),
            rides: self.rides.len(),
            trips: self.trips.len(),
            payments: self.payments.len(),
        }
    }

    #[cfg(test)]
    fn locked_rows(&self) -> usize {
        self.row_locks.len()
    }

    /// Opens a transaction holding the locks for `keys`.
    ///
    /// Every row the transaction will write must be named here. Locks are
    /// acquired in [`RowKey`] order and released when the transaction is
    /// committed or dropped.
    pub async fn begin(&self, keys: impl IntoIterator<Item = RowKey>) -> Transaction<'_> {
        let keys: BTreeSet<RowKey> = keys.into_iter().collect();
        let mut guards = Vec::with_capacity(keys.len());

        for key in &keys {
            let lock = self.row_locks.entry(*key).or_default().value().clone();
            guards.push(RowGuard::new(self, *key, lock.lock_owned().await));
        }

        Transaction::new(self, keys, guards)
    }
}
