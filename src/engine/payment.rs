use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::models::trip::TripStatus;
use crate::store::{RowKey, Store};

/// Largest accepted gap between the charged amount and the trip fare.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Whatever actually moves the money. Called once per trip, inside the
/// payment transaction.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(&self, trip_id: Uuid, amount: f64, method: PaymentMethod) -> PaymentStatus;
}

/// Stand-in processor that approves a fixed share of charges at random.
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    success_rate: f64,
}

impl SimulatedProcessor {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    fn approve(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_rate)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn charge(&self, _trip_id: Uuid, _amount: f64, _method: PaymentMethod) -> PaymentStatus {
        if self.approve() {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        }
    }
}

/// Records the single payment attempt for an ended trip.
///
/// The attempt is stored whatever the processor says; only a success
/// promotes the trip to PAID. Either way the trip cannot be charged again.
pub async fn process_payment(
    store: &Store,
    processor: &dyn PaymentProcessor,
    trip_id: Uuid,
    amount: f64,
    method: PaymentMethod,
) -> Result<Payment, AppError> {
    let mut tx = store.begin([RowKey::Trip(trip_id)]).await;

    let mut trip = tx
        .trip(trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;

    if trip.status == TripStatus::Paid || tx.payment_for_trip(trip_id).is_some() {
        return Err(AppError::Conflict(format!(
            "payment already processed for trip {trip_id}"
        )));
    }
    if !trip.status.can_pay() {
        return Err(AppError::Conflict(format!(
            "trip {trip_id} must be ended before payment"
        )));
    }
    if let Some(fare) = trip.fare {
        if (amount - fare).abs() > AMOUNT_TOLERANCE {
            return Err(AppError::Conflict(format!(
                "payment amount must match trip fare ({fare:.2})"
            )));
        }
    }

    let status = processor.charge(trip_id, amount, method).await;
    let payment = Payment {
        id: Uuid::new_v4(),
        trip_id,
        amount,
        status,
        method,
        created_at: Utc::now(),
    };

    tx.insert_payment(payment.clone())?;
    if status == PaymentStatus::Success {
        trip.status = TripStatus::Paid;
        tx.update_trip(trip)?;
    }
    tx.commit().await;

    info!(
        payment_id = %payment.id,
        trip_id = %trip_id,
        amount,
        status = ?status,
        "payment processed"
    );

    Ok(payment)
}
