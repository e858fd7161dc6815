// ABOUTME: Page request types for keyset-paginated journal queries and their defaulting rules.
// ABOUTME: Also parses the `YYYY-MM-DDTHH:MM` form timestamps used by the query boundary.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timezone::Location;

/// Page size used when the caller does not give one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Format of the `start`/`end` query parameters.
pub const FORM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Default window start is this far before now.
pub fn default_lookback() -> Duration {
    Duration::hours(1)
}

/// Default window length when only the start is known.
pub fn default_window() -> Duration {
    Duration::minutes(10)
}

/// A page request as received from a caller. Every field may be omitted;
/// `resolve` fills in the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub limit: Option<u32>,
    /// Ordinal of the last record already seen; 0 for the first page.
    #[serde(default)]
    pub cursor: u64,
    pub container: Option<String>,
    pub host: Option<String>,
    pub filter: Option<String>,
}

/// A page request with every default applied. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
    pub cursor: u64,
    pub container: Option<String>,
    pub host: Option<String>,
    /// Case-insensitive substring matched against the message field.
    pub filter: Option<String>,
}

impl PageRequest {
    /// Apply defaults relative to `now`: limit 10, start one hour ago, end
    /// ten minutes after start. A zero limit counts as omitted, and empty
    /// filter strings are dropped rather than matched.
    pub fn resolve(self, now: DateTime<Utc>) -> PageQuery {
        let start = self
            .start
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| now - default_lookback());
        let end = self
            .end
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| start + default_window());
        let limit = match self.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => n,
        };

        PageQuery {
            start,
            end,
            limit,
            cursor: self.cursor,
            container: non_empty(self.container),
            host: non_empty(self.host),
            filter: non_empty(self.filter),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a `YYYY-MM-DDTHH:MM` wall-clock time in `location`.
pub fn parse_form_time(text: &str, location: &Location) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), FORM_TIME_FORMAT).ok()?;
    location.from_local(naive)
}

/// Render a timestamp back into the `YYYY-MM-DDTHH:MM` form.
pub fn format_form_time(time: &DateTime<FixedOffset>) -> String {
    time.format(FORM_TIME_FORMAT).to_string()
}
