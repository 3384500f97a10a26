use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::{validate_point, validate_positive};
use crate::engine::drivers::{self, DEFAULT_NEARBY_RADIUS_KM};
use crate::error::AppError;
use crate::models::assignment::Assignment;
use crate::models::driver::{Driver, GeoPoint};
use crate::models::ride::NearbyRide;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/drivers/:id/location", post(update_location))
        .route("/v1/drivers/:id/accept", post(accept_ride))
        .route("/v1/drivers/:id/nearby-rides", get(nearby_rides))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct AcceptRideRequest {
    pub ride_id: Uuid,
}

#[derive(Deserialize)]
pub struct NearbyRidesQuery {
    pub radius: Option<f64>,
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    validate_point("location", &payload.location)?;
    Ok(Json(
        drivers::update_location(&state, id, payload.location).await?,
    ))
}

async fn accept_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptRideRequest>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(drivers::accept_ride(&state, id, payload.ride_id).await?))
}

async fn nearby_rides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<NearbyRidesQuery>,
) -> Result<Json<Vec<NearbyRide>>, AppError> {
    let radius = query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    validate_positive("radius", radius)?;

    Ok(Json(drivers::nearby_rides(&state, id, radius)?))
}
