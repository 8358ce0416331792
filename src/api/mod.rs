//! HTTP API
//!
//! JSON endpoints for sign-up/sign-in, class management, CSV uploads and
//! aggregated results. Every route except `/health`, `/api/signup` and
//! `/api/signin` needs a bearer token.

mod classes;
mod error;
mod health;
mod results;
mod session;
mod uploads;

pub use error::ApiError;
pub use session::AuthContext;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::infra::Backends;
use crate::parser::ParseMode;
use crate::services::{AuthApi, GradebookStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GradebookStore>,
    pub auth: Arc<dyn AuthApi>,
    pub parse_mode: ParseMode,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Self {
        Self {
            store: backends.store,
            auth: backends.auth,
            parse_mode: config.parse_mode,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/signup", post(session::signup))
        .route("/api/signin", post(session::signin))
        .route(
            "/api/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route("/api/classes/:class_id/roster", post(uploads::upload_roster))
        .route(
            "/api/classes/:class_id/objectives",
            post(uploads::upload_objectives),
        )
        .route("/api/classes/:class_id/grades", post(uploads::upload_grades))
        .route("/api/classes/:class_id/results", get(results::class_results))
        .route("/api/classes/:class_id/search", get(results::search_class))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
