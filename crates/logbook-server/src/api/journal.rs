// ABOUTME: Journal API handlers: blob ingestion, the table view, and the raw cursor page.
// ABOUTME: Query parameters are parsed leniently; anything unusable falls back to its default.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use logbook_core::page::{DEFAULT_LIMIT, default_lookback, default_window, parse_form_time};
use logbook_core::{Location, LogRecord, TableRequest, build_table};
use serde::{Deserialize, Serialize};

use crate::app_state::SharedState;
use crate::error::ApiError;

/// Request body for journal ingestion.
#[derive(Debug, Deserialize)]
pub struct JournalBody {
    /// Newline-delimited journald JSON export.
    pub logs: String,
}

/// Query parameters shared by both read endpoints. Every field is kept as
/// raw text so a bad value degrades to its default instead of failing.
#[derive(Debug, Default, Deserialize)]
pub struct JournalParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub timezone: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    pub cursor: Option<String>,
    pub container: Option<String>,
    pub host: Option<String>,
    pub filter: Option<String>,
}

impl JournalParams {
    /// Zone named by the request, or `default` when none is given.
    pub fn location(&self, default: Location) -> Location {
        match self.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Location::resolve(name),
            _ => default,
        }
    }

    /// Resolve the parameters relative to `now`. Start defaults to one hour
    /// ago and end to ten minutes after that, each independently. Page and
    /// page size below 1 take their defaults.
    pub fn table_request(&self, location: &Location, now: DateTime<Utc>) -> TableRequest {
        let fallback_start = location.localize(now - default_lookback());
        let start = self
            .start
            .as_deref()
            .and_then(|s| parse_form_time(s, location))
            .unwrap_or(fallback_start);
        let end = self
            .end
            .as_deref()
            .and_then(|s| parse_form_time(s, location))
            .unwrap_or(fallback_start + default_window());

        let page = parse_at_least_one(self.page.as_deref()).unwrap_or(1);
        let page_size = parse_at_least_one(self.page_size.as_deref()).unwrap_or(DEFAULT_LIMIT);
        let cursor = self
            .cursor
            .as_deref()
            .and_then(|c| c.trim().parse::<u64>().ok());

        TableRequest {
            start,
            end,
            page,
            page_size,
            cursor,
            container: self.container.clone(),
            host: self.host.clone(),
            filter: self.filter.clone(),
        }
    }
}

fn parse_at_least_one(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
}

/// Response body of the raw page endpoint.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub records: Vec<LogRecord>,
    /// Ordinal to pass as `cursor` for the following page; absent when the
    /// page came back short.
    pub next_cursor: Option<u64>,
}

/// POST /journal - Ingest a blob of journal lines. Answers 200 with an empty body.
pub async fn save_journal(
    State(state): State<SharedState>,
    Json(body): Json<JournalBody>,
) -> Result<StatusCode, ApiError> {
    let report = state.journal.save_journal_logs(&body.logs).await?;
    tracing::debug!(
        parsed = report.parsed,
        already_stored = report.already_stored,
        written = report.written,
        "journal ingested"
    );
    Ok(StatusCode::OK)
}

/// GET /journal - One page of the journal table view.
pub async fn journal_table(
    State(state): State<SharedState>,
    Query(params): Query<JournalParams>,
) -> Result<impl IntoResponse, ApiError> {
    let location = params.location(state.location);
    let request = params.table_request(&location, Utc::now());

    let records = state.journal.get_log_page(request.page_request()).await?;
    Ok(Json(build_table(&request, &records, &location)))
}

/// GET /api/journal/page - Raw records of one page plus the next cursor.
pub async fn journal_page(
    State(state): State<SharedState>,
    Query(params): Query<JournalParams>,
) -> Result<impl IntoResponse, ApiError> {
    let location = params.location(state.location);
    let request = params.table_request(&location, Utc::now());
    let page_request = request.page_request();
    let limit = request.page_size as usize;

    let records = state.journal.get_log_page(page_request).await?;
    let next_cursor = if records.len() == limit {
        records.last().map(|r| r.ordinal)
    } else {
        None
    };

    Ok(Json(PageResponse {
        records,
        next_cursor,
    }))
}
