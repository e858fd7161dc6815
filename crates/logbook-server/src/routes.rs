// ABOUTME: Route definitions for the logbook HTTP API.
// ABOUTME: Assembles ingestion, table, page, and health routes into one traced Axum Router.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
/// Journal uploads are capped at `state.max_body_bytes` instead of axum's 2 MB default.
pub fn create_router(state: SharedState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/health", get(health))
        .route(
            "/journal",
            get(api::journal::journal_table)
                .merge(post(api::journal::save_journal).layer(upload_limit)),
        )
        .route("/api/journal/page", get(api::journal::journal_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
