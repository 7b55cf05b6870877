//! Route definitions.
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check (high priority)
        .route("/health", get(health_handler))
        // Availability probe
        .route("/idle/:gameid/:session", get(idle_handler))
        // Game lifecycle
        .route("/initialize", post(initialize_handler))
        .route("/play", post(play_handler))
        .route("/recall", post(recall_handler))
        .route("/recovery", post(recovery_handler))
        // PRNG service
        .route("/rng/:min/:max", get(rng_handler))
        .route("/shuffle/:list", get(shuffle_handler))
        .route("/distribution", post(distribution_handler))
        // Attach shared state
        .with_state(state)
}
