// ABOUTME: API module containing the HTTP handler functions for logbook.
// ABOUTME: Journal ingestion and the two query views live in the journal sub-module.

pub mod journal;
