pub mod analyzers;
pub mod api;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod ingest;
pub mod models;
pub mod output;
pub mod parser;
pub mod services;

pub use api::{AppState, build_router};
