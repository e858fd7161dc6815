// ABOUTME: Parses newline-delimited journald JSON exports into LogCandidates.
// ABOUTME: Hashes each normalized raw line with SHA-256 and skips malformed lines with a warning.

use std::borrow::Cow;
use std::num::ParseIntError;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::record::{LogCandidate, LogFields, TIMESTAMP_FIELD};
use crate::timezone::Location;

/// Longest prefix of an offending line echoed into diagnostics.
const PREVIEW_CHARS: usize = 200;

/// Why a single journal line was dropped. Only ever logged, never returned
/// from `parse_journal`.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line is not a json object")]
    NotAnObject,

    #[error("missing {} field", TIMESTAMP_FIELD)]
    MissingTimestamp,

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: ParseIntError,
    },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Hex-encoded SHA-256 digest of a line.
pub fn content_hash(line: &str) -> String {
    hex::encode(Sha256::digest(line.as_bytes()))
}

/// Single-line form of a raw line: a trailing carriage return is dropped and
/// embedded newlines are escaped. This is the exact text that gets hashed.
pub fn normalize_line(raw: &str) -> Cow<'_, str> {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    if line.contains('\n') {
        Cow::Owned(line.replace('\n', "\\n"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Parse one raw journal line.
pub fn parse_line(raw: &str, location: &Location) -> Result<LogCandidate, LineError> {
    let line = normalize_line(raw);

    let object = match serde_json::from_str::<Value>(&line)? {
        Value::Object(object) => object,
        _ => return Err(LineError::NotAnObject),
    };

    let fields: LogFields = object
        .into_iter()
        .map(|(key, value)| (key, stringify(value)))
        .collect();

    let raw_timestamp = fields
        .get(TIMESTAMP_FIELD)
        .ok_or(LineError::MissingTimestamp)?;
    let micros = raw_timestamp
        .parse::<i64>()
        .map_err(|source| LineError::InvalidTimestamp {
            value: raw_timestamp.clone(),
            source,
        })?;
    let time = location
        .from_unix_micros(micros)
        .ok_or(LineError::TimestampOutOfRange(micros))?;

    Ok(LogCandidate {
        time,
        hash: content_hash(&line),
        fields,
    })
}

/// Parse a blob of newline-separated journal lines. Blank lines are ignored;
/// malformed lines are logged and dropped. Output keeps input order.
pub fn parse_journal(blob: &str, location: &Location) -> Vec<LogCandidate> {
    let mut candidates = Vec::new();

    for (index, raw) in blob.split('\n').enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match parse_line(raw, location) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                tracing::warn!(
                    line = index + 1,
                    error = %e,
                    raw = %preview(raw),
                    "skipping unparseable journal line"
                );
            }
        }
    }

    candidates
}

/// Coerce a JSON value into the string stored in `LogFields`.
///
/// journald exports fields that are not valid UTF-8 (often `MESSAGE` with
/// terminal escapes) as arrays of byte values; those are decoded back into
/// text. Other composite values keep their compact JSON form.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => match as_bytes(&items) {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => Value::Array(items).to_string(),
        },
        object @ Value::Object(_) => object.to_string(),
    }
}

fn as_bytes(items: &[Value]) -> Option<Vec<u8>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn preview(raw: &str) -> String {
    if raw.chars().count() <= PREVIEW_CHARS {
        raw.to_string()
    } else {
        let mut cut: String = raw.chars().take(PREVIEW_CHARS).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CONTAINER_FIELD, HOST_FIELD, MESSAGE_FIELD};

    fn utc() -> Location {
        Location::resolve("UTC")
    }

    #[test]
    fn parses_journal_export_lines() {
        let blob = concat!(
            r#"{"__REALTIME_TIMESTAMP":"1723552255278199","SYSLOG_TIMESTAMP":"2024-08-12T23:13:00.437669742Z","_HOSTNAME":"couchdb-1"}"#,
            "\n",
            r#"{"_HOSTNAME":"couchdb-1","_SOURCE_REALTIME_TIMESTAMP":"1723504381256471","__REALTIME_TIMESTAMP":"1723552255349199"}"#,
        );
        let loc = Location::resolve("Europe/Berlin");

        let entries = parse_journal(blob, &loc);

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].hash,
            "be44de7412847a49f94abb202015b94ee690320e3c0f4a5d320933364fc9c5f9"
        );
        assert_eq!(
            entries[1].hash,
            "de774812e635dd91ea6e8d1434d1cf68e5bc655d32214088054b878556c6cd3e"
        );
        assert_eq!(entries[0].time_micros(), 1_723_552_255_278_199);
        assert_eq!(entries[1].time_micros(), 1_723_552_255_349_199);
        // Localized into the requested zone (CEST in August)
        assert_eq!(entries[0].time.offset().local_minus_utc(), 7200);

        assert_eq!(entries[0].fields.len(), 3);
        assert_eq!(
            entries[0].fields["SYSLOG_TIMESTAMP"],
            "2024-08-12T23:13:00.437669742Z"
        );
        assert_eq!(entries[1].fields[HOST_FIELD], "couchdb-1");
        assert_eq!(
            entries[1].fields["_SOURCE_REALTIME_TIMESTAMP"],
            "1723504381256471"
        );
    }

    #[test]
    fn decodes_byte_array_values() {
        let line = r#"{"__REALTIME_TIMESTAMP":"1723796509016948","CONTAINER_NAME":"gitlab-runner","_SELINUX_CONTEXT":"unconfined\n","MESSAGE":[67,104,101,99,107,105,110,103,32,27,91,48,59,109,106,111,98,115],"PRIORITY":"3"}"#;

        let entries = parse_journal(line, &utc());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields[CONTAINER_FIELD], "gitlab-runner");
        assert_eq!(entries[0].fields[MESSAGE_FIELD], "Checking \u{1b}[0;mjobs");
        assert_eq!(entries[0].fields["_SELINUX_CONTEXT"], "unconfined\n");
    }

    #[test]
    fn coerces_non_string_values() {
        let line = r#"{"__REALTIME_TIMESTAMP":1000000,"flag":true,"none":null,"nested":{"a":1},"list":["x",2],"big":[1,999]}"#;

        let entry = parse_line(line, &utc()).unwrap();

        assert_eq!(entry.fields[TIMESTAMP_FIELD], "1000000");
        assert_eq!(entry.fields["flag"], "true");
        assert_eq!(entry.fields["none"], "");
        assert_eq!(entry.fields["nested"], r#"{"a":1}"#);
        assert_eq!(entry.fields["list"], r#"["x",2]"#);
        assert_eq!(entry.fields["big"], "[1,999]");
        assert_eq!(entry.time_micros(), 1_000_000);
    }

    #[test]
    fn drops_line_with_bad_timestamp() {
        let blob = concat!(
            r#"{"__REALTIME_TIMESTAMP":"1000000","_HOSTNAME":"a"}"#,
            "\n",
            r#"{"__REALTIME_TIMESTAMP":"yesterday","_HOSTNAME":"b"}"#,
        );

        let entries = parse_journal(blob, &utc());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields[HOST_FIELD], "a");
    }

    #[test]
    fn line_errors_name_the_reason() {
        let loc = utc();
        assert!(matches!(parse_line("{not json", &loc), Err(LineError::Json(_))));
        assert!(matches!(parse_line("[1,2,3]", &loc), Err(LineError::NotAnObject)));
        assert!(matches!(
            parse_line(r#"{"_HOSTNAME":"a"}"#, &loc),
            Err(LineError::MissingTimestamp)
        ));
        assert!(matches!(
            parse_line(r#"{"__REALTIME_TIMESTAMP":"12a"}"#, &loc),
            Err(LineError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            parse_line(r#"{"__REALTIME_TIMESTAMP":"9223372036854775807"}"#, &loc),
            Err(LineError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn skips_blank_lines_and_keeps_order() {
        let blob = "\n{\"__REALTIME_TIMESTAMP\":\"3\",\"n\":\"1\"}\n\n  \n{\"__REALTIME_TIMESTAMP\":\"1\",\"n\":\"2\"}\n";

        let entries = parse_journal(blob, &utc());

        let order: Vec<&str> = entries.iter().map(|e| e.fields["n"].as_str()).collect();
        assert_eq!(order, vec!["1", "2"]);
    }

    #[test]
    fn crlf_line_endings_hash_like_lf() {
        let lf = parse_journal("{\"__REALTIME_TIMESTAMP\":\"5\"}\n", &utc());
        let crlf = parse_journal("{\"__REALTIME_TIMESTAMP\":\"5\"}\r\n", &utc());

        assert_eq!(crlf.len(), 1);
        assert_eq!(lf[0].hash, crlf[0].hash);
    }

    #[test]
    fn hash_depends_on_raw_text_not_field_order() {
        let a = parse_line(r#"{"__REALTIME_TIMESTAMP":"1","x":"y"}"#, &utc()).unwrap();
        let b = parse_line(r#"{"x":"y","__REALTIME_TIMESTAMP":"1"}"#, &utc()).unwrap();
        let a_again = parse_line(r#"{"__REALTIME_TIMESTAMP":"1","x":"y"}"#, &utc()).unwrap();

        assert_eq!(a.fields, b.fields);
        assert_ne!(a.hash, b.hash);
        assert_eq!(a.hash, a_again.hash);
    }

    #[test]
    fn normalize_escapes_embedded_newlines() {
        assert_eq!(normalize_line("a\nb"), "a\\nb");
        assert_eq!(normalize_line("abc\r"), "abc");
        assert!(matches!(normalize_line("abc"), Cow::Borrowed(_)));
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(r#"{"__REALTIME_TIMESTAMP":"1000000","_HOSTNAME":"a"}"#),
            "dacdc0d36204563ad0532b2586985136f26448a0d247c7260f9d47a88a03ea05"
        );
        assert_eq!(content_hash("").len(), 64);
    }
}
