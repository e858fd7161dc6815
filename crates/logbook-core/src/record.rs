// ABOUTME: Defines journal log records: parsed candidates awaiting storage and stored rows.
// ABOUTME: Also names the fixed journald field keys the rest of the system relies on.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Field holding the record's business timestamp, microseconds since the epoch.
pub const TIMESTAMP_FIELD: &str = "__REALTIME_TIMESTAMP";
/// Field holding the docker container name, used by the container filter.
pub const CONTAINER_FIELD: &str = "CONTAINER_NAME";
/// Field holding the originating host, used by the host filter.
pub const HOST_FIELD: &str = "_HOSTNAME";
/// Field holding the human-readable message, used by the text filter.
pub const MESSAGE_FIELD: &str = "MESSAGE";

/// Flattened journal entry: every value coerced to a string.
pub type LogFields = BTreeMap<String, String>;

/// A parsed journal line that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCandidate {
    pub time: DateTime<FixedOffset>,
    /// Hex SHA-256 of the normalized raw line; the deduplication key.
    pub hash: String,
    pub fields: LogFields,
}

impl LogCandidate {
    /// Timestamp as microseconds since the epoch, the stored representation.
    pub fn time_micros(&self) -> i64 {
        self.time.timestamp_micros()
    }
}

/// A stored journal entry as returned by a page query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Store-assigned surrogate key. Not related to time ordering.
    pub id: i64,
    pub time: DateTime<FixedOffset>,
    pub hash: String,
    pub fields: LogFields,
    /// 1-based rank of this record inside the query's time-ordered result set.
    /// Only meaningful for the query that produced it; used as the next cursor.
    pub ordinal: u64,
}

impl LogRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.field(MESSAGE_FIELD)
    }

    pub fn host(&self) -> Option<&str> {
        self.field(HOST_FIELD)
    }

    pub fn container(&self) -> Option<&str> {
        self.field(CONTAINER_FIELD)
    }
}
