use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::validate_point;
use crate::engine::rides;
use crate::error::AppError;
use crate::models::driver::{GeoPoint, Tier};
use crate::models::ride::{CreateRideOutcome, NewRide, RideDetails};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/rides", post(create_ride))
        .route("/v1/rides/:id", get(get_ride))
}

#[derive(Deserialize)]
pub struct CreateRideRequest {
    pub rider_id: Uuid,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub auto_assign: bool,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<CreateRideOutcome>, AppError> {
    validate_point("pickup", &payload.pickup)?;
    validate_point("destination", &payload.destination)?;

    let outcome = rides::create_ride(
        &state,
        NewRide {
            rider_id: payload.rider_id,
            pickup: payload.pickup,
            destination: payload.destination,
            tier: payload.tier,
            auto_assign: payload.auto_assign,
        },
    )
    .await?;

    Ok(Json(outcome))
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideDetails>, AppError> {
    Ok(Json(rides::get_ride(&state, id).await?))
}
