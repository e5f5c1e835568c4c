// Presentation layer - HTTP surface
pub mod app_state;
pub mod error;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Compression is handled in the response builders, so no CompressionLayer here.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route(
            "/selection/points",
            post(select_measurements).delete(clear_selection),
        )
        .route("/fits", post(run_regression))
        .route("/results", get(list_results).post(extract_result))
        .route("/results/export", post(export_results))
        .route(
            "/results/:id",
            get(get_result).patch(edit_result).delete(remove_result),
        )
        .route("/chart", get(chart_state))
        .route("/chart/sync", post(sync_chart))
        .with_state(state)
}
