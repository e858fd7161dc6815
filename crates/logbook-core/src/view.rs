// ABOUTME: Builds the journal table view model handed to the rendering layer.
// ABOUTME: Maps page/page-size navigation onto ordinal cursors and formats rows for display.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::page::{PageRequest, format_form_time};
use crate::record::LogRecord;
use crate::timezone::Location;

/// Time format of the first column.
pub const ROW_TIME_FORMAT: &str = "%H:%M:%S%.3f %d.%m.%Y";

const JOURNAL_URL: &str = "/journal";

/// Page-oriented navigation request, as issued by the journal table UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Explicit ordinal cursor; overrides the one derived from `page`.
    pub cursor: Option<u64>,
    pub container: Option<String>,
    pub host: Option<String>,
    pub filter: Option<String>,
}

impl TableRequest {
    /// Ordinal cursor for this page: everything on earlier pages has been seen.
    pub fn cursor(&self) -> u64 {
        self.cursor.unwrap_or_else(|| {
            u64::from(self.page_size) * u64::from(self.page.saturating_sub(1))
        })
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            start: Some(self.start),
            end: Some(self.end),
            limit: Some(self.page_size),
            cursor: self.cursor(),
            container: self.container.clone(),
            host: self.host.clone(),
            filter: self.filter.clone(),
        }
    }

    fn by_container(&self) -> bool {
        self.container.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRangeInput {
    pub timestamp: String,
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationButton {
    pub shown: bool,
    pub url: String,
    pub page: u32,
    pub label: String,
    pub name: String,
}

/// Everything the journal page template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub next_url: String,
    pub start_input: DateRangeInput,
    pub end_input: DateRangeInput,
    pub page_size: u32,
    pub previous_button: PaginationButton,
    pub next_button: PaginationButton,
    pub container: Option<String>,
    pub host: Option<String>,
    pub filter: Option<String>,
}

/// Assemble the table for one page of records.
///
/// When filtering by container the log column shows only the message and a
/// host column is added; otherwise the log column holds the full field map
/// as JSON. A full page is taken as a hint that another page may follow.
pub fn build_table(
    request: &TableRequest,
    records: &[LogRecord],
    location: &Location,
) -> JournalTable {
    let page = request.page.max(1);
    let by_container = request.by_container();

    let mut headers = vec!["Time".to_string(), "Log".to_string()];
    if by_container {
        headers.push("Host".to_string());
    }

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let time = location
            .localize(record.time.with_timezone(&Utc))
            .format(ROW_TIME_FORMAT)
            .to_string();

        let log = if by_container {
            record.message().unwrap_or_default().to_string()
        } else {
            match serde_json::to_string(&record.fields) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(id = record.id, error = %e, "failed to serialize log fields");
                    continue;
                }
            }
        };

        let mut row = vec![time, log];
        if by_container {
            row.push(record.host().unwrap_or_default().to_string());
        }
        rows.push(row);
    }

    let page_full = records.len() == request.page_size as usize;
    let next_page = if page_full { page + 1 } else { page };

    JournalTable {
        headers,
        rows,
        next_url: JOURNAL_URL.to_string(),
        start_input: date_input(&request.start, "start", "Start"),
        end_input: date_input(&request.end, "end", "End"),
        page_size: request.page_size,
        previous_button: PaginationButton {
            shown: page != 1,
            url: JOURNAL_URL.to_string(),
            page: (page - 1).max(1),
            label: "Previous".to_string(),
            name: "previous".to_string(),
        },
        next_button: PaginationButton {
            shown: next_page != page,
            url: JOURNAL_URL.to_string(),
            page: next_page,
            label: "Next".to_string(),
            name: "next".to_string(),
        },
        container: request.container.clone(),
        host: request.host.clone(),
        filter: request.filter.clone(),
    }
}

fn date_input(time: &DateTime<FixedOffset>, name: &str, label: &str) -> DateRangeInput {
    DateRangeInput {
        timestamp: format_form_time(time),
        name: name.to_string(),
        label: label.to_string(),
    }
}
