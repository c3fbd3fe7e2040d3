//! In-memory row table backing the output sink.

use std::collections::BTreeMap;

use scorepull_shared::{COLUMN_TITLES, HEADER_ROWS, Result, ScorePullError, ScoreRecord};

/// Rows keyed by 0-based row index. Row 0 holds the column titles.
///
/// Not synchronized; callers hold it behind a lock.
#[derive(Debug, Clone)]
pub(crate) struct Table {
    rows: BTreeMap<usize, Vec<String>>,
}

impl Table {
    /// A table holding only the header row.
    pub(crate) fn with_header() -> Self {
        let mut rows = BTreeMap::new();
        rows.insert(0, COLUMN_TITLES.iter().map(|t| t.to_string()).collect());
        Self { rows }
    }

    /// Place `records` on consecutive rows starting at `offset`, replacing
    /// whatever those rows held.
    pub(crate) fn set_rows(&mut self, offset: usize, records: &[ScoreRecord]) -> Result<()> {
        if offset < HEADER_ROWS {
            return Err(ScorePullError::validation(format!(
                "row {offset} is reserved for the header"
            )));
        }
        for (i, record) in records.iter().enumerate() {
            let cells = record.cells().iter().map(|c| c.to_string()).collect();
            self.rows.insert(offset + i, cells);
        }
        Ok(())
    }

    /// Number of rows holding records (header excluded).
    pub(crate) fn data_rows(&self) -> usize {
        self.rows.len().saturating_sub(HEADER_ROWS)
    }

    /// Occupied rows in ascending row order, header first.
    pub(crate) fn rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.rows.iter().map(|(idx, cells)| (*idx, cells))
    }
}
