//! Tabular output sink for extracted score records.
//!
//! The [`RecordSink`] trait is the only surface fetch tasks see: they place a
//! page of records at a row offset and the sink persists the whole table.
//! [`CsvSink`] is the file-backed implementation.
//!
//! **Row layout:**
//! - Row 0: the fixed column titles, placed when the sink is created
//! - Rows `1..`: one record per row, placed by page at its row offset

pub mod csv_sink;
mod table;

use async_trait::async_trait;
use scorepull_shared::{Result, ScoreRecord};

pub use csv_sink::CsvSink;

/// Append-only tabular destination shared by concurrent fetch tasks.
///
/// Implementations must make `write_at` and `persist` mutually exclusive.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Place `records` on consecutive rows starting at `row_offset`, then
    /// persist the full table. Calling twice with identical arguments leaves
    /// the table unchanged.
    async fn write_at(&self, row_offset: usize, records: &[ScoreRecord]) -> Result<()>;

    /// Flush the full table to durable storage. Safe to call repeatedly.
    async fn persist(&self) -> Result<()>;
}
