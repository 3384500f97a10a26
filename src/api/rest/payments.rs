use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::validate_positive;
use crate::engine::trips;
use crate::error::AppError;
use crate::models::payment::{Payment, PaymentMethod};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/payments", post(process_payment))
}

#[derive(Deserialize)]
pub struct ProcessPaymentRequest {
    pub trip_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
}

async fn process_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProcessPaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    validate_positive("amount", payload.amount)?;

    Ok(Json(
        trips::pay(&state, payload.trip_id, payload.amount, payload.method).await?,
    ))
}
