use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;

use crate::models::driver::Driver;
use crate::models::rider::Rider;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/data/riders", get(list_riders))
        .route("/v1/data/drivers", get(list_drivers))
}

async fn list_riders(State(state): State<Arc<AppState>>) -> Json<Vec<Rider>> {
    Json(state.store.riders())
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(state.store.drivers())
}
