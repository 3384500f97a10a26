use std::time::Instant;

use uuid::Uuid;

use crate::engine::payment::process_payment;
use crate::engine::settlement;
use crate::error::AppError;
use crate::models::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::models::trip::{Trip, TripSettlement};
use crate::state::AppState;

pub async fn start_trip(state: &AppState, trip_id: Uuid) -> Result<Trip, AppError> {
    settlement::start_trip(&state.store, trip_id).await
}

pub async fn end_trip(state: &AppState, trip_id: Uuid) -> Result<TripSettlement, AppError> {
    let start = Instant::now();
    let result = settlement::end_trip(
        &state.store,
        state.cache.as_ref(),
        &state.fare_rates,
        trip_id,
    )
    .await;
    state
        .metrics
        .trip_end_duration_seconds
        .observe(start.elapsed().as_secs_f64());

    let settled = result?;
    state.metrics.trips_ended_total.inc();
    Ok(settled)
}

pub async fn pay(
    state: &AppState,
    trip_id: Uuid,
    amount: f64,
    method: PaymentMethod,
) -> Result<Payment, AppError> {
    let payment = process_payment(
        &state.store,
        state.payments.as_ref(),
        trip_id,
        amount,
        method,
    )
    .await?;

    let label = match payment.status {
        PaymentStatus::Success => "success",
        PaymentStatus::Failed => "failed",
    };
    state
        .metrics
        .payments_total
        .with_label_values(&[label])
        .inc();

    Ok(payment)
}
