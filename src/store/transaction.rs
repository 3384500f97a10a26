use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::payment::Payment;
use crate::models::ride::RideRequest;
use crate::models::trip::Trip;
use crate::store::{RowKey, Store, StoreError};

/// Held lock on one row. Releasing it drops the row's lock entry once no
/// other transaction is holding or waiting for it.
pub(super) struct RowGuard<'a> {
    store: &'a Store,
    key: RowKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<'a> RowGuard<'a> {
    pub(super) fn new(store: &'a Store, key: RowKey, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            store,
            key,
            guard: Some(guard),
        }
    }
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.store
            .row_locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Unit of work against the [`Store`].
///
/// Reads see this transaction's own staged writes first, then committed rows.
/// Updates are only accepted for rows locked in [`Store::begin`].
pub struct Transaction<'a> {
    store: &'a Store,
    locked: BTreeSet<RowKey>,
    _guards: Vec<RowGuard<'a>>,
    drivers: HashMap<Uuid, Driver>,
    rides: HashMap<Uuid, RideRequest>,
    trips: HashMap<Uuid, Trip>,
    payments: Vec<Payment>,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(
        store: &'a Store,
        locked: BTreeSet<RowKey>,
        guards: Vec<RowGuard<'a>>,
    ) -> Self {
        Self {
            store,
            locked,
            _guards: guards,
            drivers: HashMap::new(),
            rides: HashMap::new(),
            trips: HashMap::new(),
            payments: Vec::new(),
        }
    }

    pub fn driver(&self, id: Uuid) -> Option<Driver> {
        self.drivers
            .get(&id)
            .cloned()
            .or_else(|| self.store.driver(id))
    }

    pub fn ride(&self, id: Uuid) -> Option<RideRequest> {
        self.rides.get(&id).cloned().or_else(|| self.store.ride(id))
    }

    pub fn trip(&self, id: Uuid) -> Option<Trip> {
        self.trips.get(&id).cloned().or_else(|| self.store.trip(id))
    }

    pub fn payment_for_trip(&self, trip_id: Uuid) -> Option<Payment> {
        self.payments
            .iter()
            .find(|payment| payment.trip_id == trip_id)
            .cloned()
            .or_else(|| self.store.payment_for_trip(trip_id))
    }

    pub fn update_driver(&mut self, driver: Driver) -> Result<(), StoreError> {
        self.ensure_locked(RowKey::Driver(driver.id))?;
        self.drivers.insert(driver.id, driver);
        Ok(())
    }

    pub fn update_ride(&mut self, ride: RideRequest) -> Result<(), StoreError> {
        self.ensure_locked(RowKey::Ride(ride.id))?;
        self.rides.insert(ride.id, ride);
        Ok(())
    }

    pub fn update_trip(&mut self, trip: Trip) -> Result<(), StoreError> {
        self.ensure_locked(RowKey::Trip(trip.id))?;
        self.trips.insert(trip.id, trip);
        Ok(())
    }

    /// Stages a new trip. The owning ride must be locked; one trip per ride.
    pub fn insert_trip(&mut self, trip: Trip) -> Result<(), StoreError> {
        self.ensure_locked(RowKey::Ride(trip.ride_request_id))?;

        let staged = self
            .trips
            .values()
            .any(|existing| existing.ride_request_id == trip.ride_request_id);
        if staged || self.store.trip_by_ride.contains_key(&trip.ride_request_id) {
            return Err(StoreError::UniqueViolation(format!(
                "ride {} already has a trip",
                trip.ride_request_id
            )));
        }

        self.trips.insert(trip.id, trip);
        Ok(())
    }

    /// Stages a new payment. The owning trip must be locked; one payment per
    /// trip.
    pub fn insert_payment(&mut self, payment: Payment) -> Result<(), StoreError> {
        self.ensure_locked(RowKey::Trip(payment.trip_id))?;

        if self.payment_for_trip(payment.trip_id).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "trip {} already has a payment",
                payment.trip_id
            )));
        }

        self.payments.push(payment);
        Ok(())
    }

    /// Applies every staged write, then releases the row locks.
    pub async fn commit(self) {
        let Transaction {
            store,
            locked: _,
            _guards,
            drivers,
            rides,
            trips,
            payments,
        } = self;

        let _gate = store.commit_gate.write().await;

        for (id, driver) in drivers {
            store.drivers.insert(id, driver);
        }
        for (id, ride) in rides {
            store.rides.insert(id, ride);
        }
        for (id, trip) in trips {
            store.trip_by_ride.insert(trip.ride_request_id, id);
            store.trips.insert(id, trip);
        }
        for payment in payments {
            store.payment_by_trip.insert(payment.trip_id, payment.id);
            store.payments.insert(payment.id, payment);
        }
    }

    fn ensure_locked(&self, key: RowKey) -> Result<(), StoreError> {
        if self.locked.contains(&key) {
            Ok(())
        } else {
            Err(StoreError::RowNotLocked(key))
        }
    }
}
