use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ride_dispatch::api;
use ride_dispatch::api::rest::rate_limit::rate_limited;
use ride_dispatch::config::Config;
use ride_dispatch::error::AppError;
use ride_dispatch::seed::seed_demo_data;
use ride_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let shared_state = Arc::new(AppState::from_config(&config));

    if config.seed_demo_data {
        seed_demo_data(&shared_state).await;
    }

    let cors = match &config.cors_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|err| AppError::Internal(format!("invalid CORS_ORIGIN: {err}")))?;
            CorsLayer::permissive().allow_origin(origin)
        }
        None => CorsLayer::permissive(),
    };

    let app = rate_limited(api::rest::router(shared_state), config.rate_limit)?
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        economy_rate = config.fare_rates.economy,
        premium_rate = config.fare_rates.premium,
        rate_limit = config.rate_limit.max_requests,
        "http server started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
