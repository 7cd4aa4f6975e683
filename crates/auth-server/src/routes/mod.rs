//! Route definitions
//!
//! The HTTP surface is health probes only; credential operations travel over
//! the bus.

use axum::{routing::get, Router};

use crate::handlers::{health_check, readiness_check};
use crate::state::AppState;

/// Create the router with all routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}
