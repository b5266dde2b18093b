// Contact-form relay.
//
// Accepts contact submissions from the marketing site, validates them,
// enforces a per-client quota and forwards each accepted submission once
// to an external webhook.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod upstream;
pub mod validation;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::sync::Arc;

use crate::handlers::{health_handler, metrics_handler, relay_handler};
use crate::state::AppState;

// A maximal valid submission (100 + 1000 chars, 4 bytes each) stays well under this
pub const MAX_BODY_BYTES: usize = 16 * 1024;

// /health and /metrics are fixed, everything else is the relay
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(relay_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
