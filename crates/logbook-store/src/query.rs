// ABOUTME: PageQueryEngine serves keyset-paginated pages of stored journal records.
// ABOUTME: Ranks the filtered window by (time, id) and returns rows past the cursor ordinal.

use chrono::Utc;
use logbook_core::record::{CONTAINER_FIELD, HOST_FIELD, MESSAGE_FIELD};
use logbook_core::{Location, LogFields, LogRecord, PageQuery, PageRequest};
use rusqlite::Connection;
use rusqlite::types::Value;

use crate::error::{JournalError, StoreError};
use crate::store::JournalStore;

/// A page statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Build the statement for one page.
///
/// The inner select numbers the matching rows 1..n by ascending time, with
/// the id breaking ties so equal timestamps rank the same way every time.
/// The outer select keeps rows past the cursor. Absent filters add no
/// predicate at all.
pub fn page_statement(query: &PageQuery) -> PageStatement {
    let mut params = vec![
        Value::Integer(query.start.timestamp_micros()),
        Value::Integer(query.end.timestamp_micros()),
    ];
    let mut predicates = vec!["time >= ?1".to_string(), "time <= ?2".to_string()];

    if let Some(container) = &query.container {
        params.push(Value::Text(container.clone()));
        predicates.push(format!("{} = ?{}", field_expr(CONTAINER_FIELD), params.len()));
    }
    if let Some(host) = &query.host {
        params.push(Value::Text(host.clone()));
        predicates.push(format!("{} = ?{}", field_expr(HOST_FIELD), params.len()));
    }
    if let Some(filter) = &query.filter {
        params.push(Value::Text(filter.to_lowercase()));
        predicates.push(format!(
            "instr(casefold({}), ?{}) > 0",
            field_expr(MESSAGE_FIELD),
            params.len()
        ));
    }

    params.push(Value::Integer(i64::try_from(query.cursor).unwrap_or(i64::MAX)));
    let cursor_param = params.len();
    params.push(Value::Integer(i64::from(query.limit)));
    let limit_param = params.len();

    let sql = format!(
        "SELECT id, time, hash, log, ordinal FROM (
            SELECT id, time, hash, log,
                   ROW_NUMBER() OVER (ORDER BY time ASC, id ASC) AS ordinal
            FROM logs
            WHERE {}
        )
        WHERE ordinal > ?{}
        ORDER BY ordinal ASC
        LIMIT ?{}",
        predicates.join(" AND "),
        cursor_param,
        limit_param,
    );

    PageStatement { sql, params }
}

fn field_expr(field: &str) -> String {
    format!("json_extract(log, '$.\"{}\"')", field)
}

#[derive(Clone)]
pub struct PageQueryEngine {
    store: JournalStore,
}

impl PageQueryEngine {
    pub fn new(store: JournalStore) -> Self {
        Self { store }
    }

    /// Resolve defaults against the current time and fetch the page.
    pub async fn get_page(&self, request: PageRequest) -> Result<Vec<LogRecord>, JournalError> {
        self.fetch(request.resolve(Utc::now())).await
    }

    /// Fetch one page of an already-resolved query. Records come back in
    /// ascending ordinal order, at most `limit` of them.
    pub async fn fetch(&self, query: PageQuery) -> Result<Vec<LogRecord>, JournalError> {
        let statement = page_statement(&query);
        let location = self.store.location();

        let records = self
            .store
            .run(move |conn| select_page(conn, &statement, &location))
            .await
            .map_err(JournalError::QueryFailed)?;

        tracing::debug!(
            cursor = query.cursor,
            limit = query.limit,
            returned = records.len(),
            "fetched log page"
        );
        Ok(records)
    }
}

fn select_page(
    conn: &mut Connection,
    statement: &PageStatement,
    location: &Location,
) -> Result<Vec<LogRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(&statement.sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(statement.params.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, micros, hash, log, ordinal) = row?;
        let fields: LogFields = serde_json::from_str(&log).map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("log column is not a string map: {}", e),
        })?;
        let time = location.from_unix_micros(micros).ok_or_else(|| StoreError::Corrupt {
            id,
            reason: format!("time {} is out of range", micros),
        })?;
        records.push(LogRecord {
            id,
            time,
            hash,
            fields,
            ordinal: ordinal as u64,
        });
    }
    Ok(records)
}
