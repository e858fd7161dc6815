// ABOUTME: Resolves IANA time zone names into a Location used by parsing and display.
// ABOUTME: Unknown or empty names fall back to the process-local zone with a logged warning.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone used when neither configuration nor request names one.
pub const DEFAULT_ZONE: &str = "Europe/Berlin";

/// A resolved time zone. Passed explicitly to every function that needs to
/// interpret or format wall-clock times; there is no process-wide zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Named(Tz),
    Local,
}

impl Location {
    /// Resolve a zone name. Never fails: an empty or unknown name yields
    /// `Location::Local` and a warning. The result depends only on `name`.
    pub fn resolve(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("no time zone configured, falling back to local time");
            return Location::Local;
        }

        match name.parse::<Tz>() {
            Ok(tz) => Location::Named(tz),
            Err(e) => {
                tracing::warn!(zone = name, error = %e, "failed to load time zone, falling back to local time");
                Location::Local
            }
        }
    }

    /// Display name of the zone.
    pub fn name(&self) -> &str {
        match self {
            Location::Named(tz) => tz.name(),
            Location::Local => "Local",
        }
    }

    /// Express an absolute instant in this zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Location::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            Location::Local => instant.with_timezone(&Local).fixed_offset(),
        }
    }

    /// Convert microseconds since the Unix epoch into a localized timestamp.
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn from_unix_micros(&self, micros: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::<Utc>::from_timestamp_micros(micros).map(|instant| self.localize(instant))
    }

    /// Interpret a wall-clock time in this zone. Ambiguous times (DST fall-back)
    /// resolve to the earlier instant; times inside a DST gap return `None`.
    pub fn from_local(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Location::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.fixed_offset()),
            Location::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.fixed_offset()),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::resolve(DEFAULT_ZONE)
    }
}
