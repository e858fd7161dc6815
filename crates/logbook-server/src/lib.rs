// ABOUTME: HTTP server for logbook, accepting journal uploads and serving paged queries.
// ABOUTME: Uses Axum with a shared JournalService; configuration comes from the environment.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, LogbookConfig};
pub use error::ApiError;
pub use routes::create_router;
