//! CSV-backed record sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use scorepull_shared::{Result, ScorePullError, ScoreRecord};

use crate::RecordSink;
use crate::table::Table;

/// Single-sheet CSV file fed by many concurrent writers.
///
/// The in-memory table sits behind one lock that covers both the row update
/// and the persist that follows it, so no two writers touch the table or the
/// file at the same time. Every persist rewrites the whole file from the
/// current table; the last one wins.
pub struct CsvSink {
    path: PathBuf,
    table: Mutex<Table>,
}

impl CsvSink {
    /// Create a sink that persists to `path`. The header row is placed
    /// immediately; nothing is written to disk until the first persist.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScorePullError::io(parent, e))?;
        }

        Ok(Self {
            path,
            table: Mutex::new(Table::with_header()),
        })
    }

    /// Number of data rows currently held (header excluded).
    pub async fn data_rows(&self) -> usize {
        self.table.lock().await.data_rows()
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    #[instrument(skip_all, fields(row = row_offset, records = records.len()))]
    async fn write_at(&self, row_offset: usize, records: &[ScoreRecord]) -> Result<()> {
        let mut table = self.table.lock().await;
        table.set_rows(row_offset, records)?;
        write_table(&self.path, &table)
    }

    async fn persist(&self) -> Result<()> {
        let table = self.table.lock().await;
        write_table(&self.path, &table)
    }
}

/// Write the table to a sibling temp file, then rename it over `path`.
fn write_table(path: &Path, table: &Table) -> Result<()> {
    let tmp = temp_path(path);

    let result = write_rows(&tmp, table).and_then(|()| {
        std::fs::rename(&tmp, path)
            .map_err(|e| ScorePullError::Write(format!("{}: {e}", path.display())))
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    } else {
        debug!(path = %path.display(), rows = table.data_rows(), "table persisted");
    }
    result
}

fn write_rows(tmp: &Path, table: &Table) -> Result<()> {
    let write_err = |e: csv::Error| ScorePullError::Write(format!("{}: {e}", tmp.display()));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp)
        .map_err(write_err)?;

    for (_, cells) in table.rows() {
        writer.write_record(cells).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| ScorePullError::Write(format!("{}: {e}", tmp.display())))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
