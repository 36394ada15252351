pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::config::MAX_UPLOAD_BYTES;
use crate::outline::handlers as outline;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction + scoring
        .route("/api/v1/extract", post(analysis::handle_extract))
        .route("/api/v1/score", post(analysis::handle_score))
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        // Outline API
        .route("/api/v1/outline", post(outline::handle_parse))
        .route("/api/v1/outline/apply", post(outline::handle_apply))
        .route("/api/v1/outline/edit", post(outline::handle_edit_item))
        .route("/api/v1/outline/export", post(outline::handle_export))
        // Session + billing
        .route("/api/v1/me", get(session::handle_me))
        .route("/api/v1/profile", post(session::handle_update_profile))
        .route("/api/v1/payments/checkout", post(session::handle_checkout))
        .route("/api/v1/payments/confirm", post(session::handle_confirm))
        // Multipart envelope overhead on top of the file cap.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}
