use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::post;
use uuid::Uuid;

use crate::engine::trips;
use crate::error::AppError;
use crate::models::trip::{Trip, TripSettlement};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/trips/:id/start", post(start_trip))
        .route("/v1/trips/:id/end", post(end_trip))
}

async fn start_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(trips::start_trip(&state, id).await?))
}

async fn end_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSettlement>, AppError> {
    Ok(Json(trips::end_trip(&state, id).await?))
}
