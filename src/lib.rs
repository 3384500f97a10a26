pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod seed;
pub mod state;
pub mod store;
