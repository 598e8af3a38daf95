pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers as dashboard;
use crate::screening::handlers as screening;
use crate::state::AppState;

/// Largest accepted CV upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route(
            "/api/v1/evaluations",
            post(screening::handle_evaluate).get(dashboard::handle_list_evaluations),
        )
        // Review Dashboard
        .route("/dashboard", get(dashboard::handle_dashboard_page))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
