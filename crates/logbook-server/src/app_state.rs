// ABOUTME: Shared application state for the logbook HTTP server.
// ABOUTME: Holds the journal service and the zone used when a request names none.

use std::sync::Arc;

use logbook_core::Location;
use logbook_store::{JournalService, JournalStore};

/// Largest accepted `POST /journal` body unless configured otherwise.
/// journald exports of a busy host easily exceed axum's 2 MB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub journal: JournalService,
    /// Zone for request times and table rows when the request gives none.
    pub location: Location,
    /// Body size limit for journal uploads.
    pub max_body_bytes: usize,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state around an opened store; the store's zone becomes the default.
    pub fn new(store: JournalStore) -> Self {
        Self {
            location: store.location(),
            journal: JournalService::new(store),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}
