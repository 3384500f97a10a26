use std::env;

use crate::api::rest::rate_limit::RateLimit;
use crate::cache::DEFAULT_DRIVER_TTL_SECS;
use crate::engine::settlement::FareRates;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub fare_rates: FareRates,
    pub driver_cache_ttl_secs: u64,
    pub payment_success_rate: f64,
    pub seed_demo_data: bool,
    pub cors_origin: Option<String>,
    pub rate_limit: RateLimit,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            fare_rates: FareRates {
                economy: parse_or_default("FARE_RATE_ECONOMY", 1.0)?,
                premium: parse_or_default("FARE_RATE_PREMIUM", 2.0)?,
            },
            driver_cache_ttl_secs: parse_or_default(
                "DRIVER_CACHE_TTL_SECS",
                DEFAULT_DRIVER_TTL_SECS,
            )?,
            payment_success_rate: parse_or_default("PAYMENT_SUCCESS_RATE", 0.9_f64)?
                .clamp(0.0, 1.0),
            seed_demo_data: parse_or_default("SEED_DEMO_DATA", false)?,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|raw| !raw.is_empty()),
            rate_limit: RateLimit {
                max_requests: parse_or_default(
                    "RATE_LIMIT_MAX_REQUESTS",
                    RateLimit::default().max_requests,
                )?,
                window_secs: parse_or_default(
                    "RATE_LIMIT_WINDOW_SECS",
                    RateLimit::default().window_secs,
                )?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            fare_rates: FareRates::default(),
            driver_cache_ttl_secs: DEFAULT_DRIVER_TTL_SECS,
            payment_success_rate: 0.9,
            seed_demo_data: false,
            cors_origin: None,
            rate_limit: RateLimit::default(),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
