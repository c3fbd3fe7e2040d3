//! Per-page outcomes and the run summary returned by the coordinator.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Why a page produced no rows despite being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request could not complete.
    Network,
    /// The response was not the expected envelope.
    Decode,
    /// The sink rejected the rows.
    Write,
    /// The task itself died before reporting.
    Task,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Write => "write",
            Self::Task => "task",
        };
        f.write_str(s)
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Records were placed in the sink.
    Written { records: usize },
    /// The source had no records for this page.
    Empty,
    /// The page was dropped.
    Failed { kind: FailureKind, message: String },
}

/// Outcome of a single page task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub page_index: u32,
    /// Row the page's first record was (or would have been) written to.
    pub row_offset: usize,
    pub status: PageStatus,
}

impl PageOutcome {
    pub fn written(page_index: u32, row_offset: usize, records: usize) -> Self {
        Self {
            page_index,
            row_offset,
            status: PageStatus::Written { records },
        }
    }

    pub fn empty(page_index: u32, row_offset: usize) -> Self {
        Self {
            page_index,
            row_offset,
            status: PageStatus::Empty,
        }
    }

    pub fn failed(
        page_index: u32,
        row_offset: usize,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            page_index,
            row_offset,
            status: PageStatus::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PageStatus::Failed { .. })
    }
}

/// Summary of a completed run.
///
/// A run always completes; failed pages are listed here rather than
/// returned as an error.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Time-sortable identifier, also attached to the run's tracing span.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// One entry per dispatched page, ordered by page index.
    pub outcomes: Vec<PageOutcome>,
    /// Set when the closing persist failed. Earlier per-page persists may
    /// still have left a usable file.
    pub finalize_error: Option<String>,
}

impl RunReport {
    pub fn pages_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PageStatus::Written { .. }))
            .count()
    }

    pub fn pages_empty(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == PageStatus::Empty)
            .count()
    }

    pub fn pages_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Total records handed to the sink.
    pub fn records_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                PageStatus::Written { records } => records,
                _ => 0,
            })
            .sum()
    }

    /// Failed pages, in page order.
    pub fn failures(&self) -> impl Iterator<Item = &PageOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}
