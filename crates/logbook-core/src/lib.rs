// ABOUTME: Core library for logbook: journal record model, time zones, parsing, and paging types.
// ABOUTME: Free of I/O; shared by the store and the HTTP server.

pub mod page;
pub mod parser;
pub mod record;
pub mod timezone;
pub mod view;

pub use page::{PageQuery, PageRequest};
pub use parser::{LineError, content_hash, parse_journal, parse_line};
pub use record::{LogCandidate, LogFields, LogRecord};
pub use timezone::Location;
pub use view::{JournalTable, TableRequest, build_table};
