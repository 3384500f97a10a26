pub mod data;
pub mod drivers;
pub mod payments;
pub mod rate_limit;
pub mod rides;
pub mod trips;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;

use crate::error::AppError;
use crate::geo::is_valid_point;
use crate::models::driver::GeoPoint;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(rides::router())
        .merge(drivers::router())
        .merge(trips::router())
        .merge(payments::router())
        .merge(data::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    riders: usize,
    drivers: usize,
    rides: usize,
    trips: usize,
    payments: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let counts = state.store.counts();
    Json(HealthResponse {
        status: "ok",
        riders: counts.riders,
        drivers: counts.drivers,
        rides: counts.rides,
        trips: counts.trips,
        payments: counts.payments,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

pub(crate) fn validate_point(field: &str, point: &GeoPoint) -> Result<(), AppError> {
    if is_valid_point(point) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{field} must have lat in [-90, 90] and lng in [-180, 180]"
        )))
    }
}

pub(crate) fn validate_positive(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{field} must be a positive number")))
    }
}
