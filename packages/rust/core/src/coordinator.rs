//! Bounded-concurrency pagination: dispatch one task per page, place each
//! page's records at its fixed row offset, wait for all, finalize the sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use scorepull_fetcher::PageFetcher;
use scorepull_shared::{DEFAULT_PAGE_SIZE, PageContent, PageRequest, ScorePullError};
use scorepull_sink::RecordSink;

use crate::report::{FailureKind, PageOutcome, RunReport};

// ---------------------------------------------------------------------------
// Progress hooks
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
///
/// Called from page tasks, possibly from several threads at once.
pub trait RunProgress: Send + Sync {
    /// Called once per page when its task ends, whatever the outcome.
    fn page_finished(&self, outcome: &PageOutcome, done: usize, total: usize);
    /// Called after the sink has been finalized.
    fn finished(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl RunProgress for SilentProgress {
    fn page_finished(&self, _outcome: &PageOutcome, _done: usize, _total: usize) {}
    fn finished(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// PaginationCoordinator
// ---------------------------------------------------------------------------

/// Drives a run over pages `0..page_count`.
pub struct PaginationCoordinator {
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    page_size: u32,
}

impl PaginationCoordinator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            fetcher,
            sink,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the records-per-page stride (default 20).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run without progress reporting.
    pub async fn run(&self, page_count: u32, year: i32, concurrency_limit: usize) -> RunReport {
        self.run_with_progress(page_count, year, concurrency_limit, Arc::new(SilentProgress))
            .await
    }

    /// Fetch every page with at most `concurrency_limit` fetches in flight.
    ///
    /// Never fails: page-level errors are logged and recorded in the report,
    /// and the remaining pages carry on.
    pub async fn run_with_progress(
        &self,
        page_count: u32,
        year: i32,
        concurrency_limit: usize,
        progress: Arc<dyn RunProgress>,
    ) -> RunReport {
        let run_id = Uuid::now_v7();
        let span = info_span!("run", %run_id, page_count, year, concurrency = concurrency_limit);

        self.run_inner(run_id, page_count, year, concurrency_limit, progress)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        page_count: u32,
        year: i32,
        concurrency_limit: usize,
        progress: Arc<dyn RunProgress>,
    ) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();

        if concurrency_limit == 0 {
            warn!("concurrency limit of 0 would never admit a page, using 1");
        }
        let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));
        let finished = Arc::new(AtomicUsize::new(0));
        let total = page_count as usize;

        info!(page_size = self.page_size, "starting run");

        let mut handles = Vec::with_capacity(total);

        for page_index in 0..page_count {
            let request = PageRequest::new(page_index, year, self.page_size);
            // Fixed before dispatch so completion order cannot move a page.
            let row_offset = request.row_offset();

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(page = page_index, error = %e, "semaphore closed, stopping dispatch");
                    break;
                }
            };

            debug!(page = page_index, row = row_offset, "dispatching page");

            let fetcher = self.fetcher.clone();
            let sink = self.sink.clone();
            let progress = progress.clone();
            let finished = finished.clone();

            let handle = tokio::spawn(
                async move {
                    let outcome =
                        process_page(fetcher.as_ref(), sink.as_ref(), &request, row_offset).await;
                    drop(permit);

                    let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.page_finished(&outcome, done, total);
                    outcome
                }
                .in_current_span(),
            );
            handles.push((page_index, row_offset, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (page_index, row_offset, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(page = page_index, error = %e, "page task died");
                    let outcome =
                        PageOutcome::failed(page_index, row_offset, FailureKind::Task, e.to_string());
                    let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.page_finished(&outcome, done, total);
                    outcomes.push(outcome);
                }
            }
        }

        let finalize_error = match self.sink.persist().await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "final persist failed");
                Some(e.to_string())
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            elapsed: start.elapsed(),
            outcomes,
            finalize_error,
        };

        info!(
            pages_written = report.pages_written(),
            pages_empty = report.pages_empty(),
            pages_failed = report.pages_failed(),
            records = report.records_written(),
            duration_ms = report.elapsed.as_millis(),
            "run completed"
        );

        progress.finished(&report);
        report
    }
}

/// Body of one page task: fetch, then hand any records to the sink.
async fn process_page(
    fetcher: &dyn PageFetcher,
    sink: &dyn RecordSink,
    request: &PageRequest,
    row_offset: usize,
) -> PageOutcome {
    let page_index = request.page_index;

    let mut records = match fetcher.fetch(request).await {
        Ok(PageContent::Records(records)) => records,
        Ok(PageContent::Empty) => {
            debug!(page = page_index, "page has no records");
            return PageOutcome::empty(page_index, row_offset);
        }
        Err(e) => {
            let kind = match e {
                ScorePullError::Decode(_) => FailureKind::Decode,
                _ => FailureKind::Network,
            };
            warn!(page = page_index, %kind, error = %e, "page fetch failed, skipping");
            return PageOutcome::failed(page_index, row_offset, kind, e.to_string());
        }
    };

    // A page owns exactly `page_size` rows; anything past that belongs to the
    // next page's range.
    let stride = request.page_size as usize;
    if records.len() > stride {
        warn!(
            page = page_index,
            returned = records.len(),
            page_size = stride,
            "page returned more records than its row range, truncating"
        );
        records.truncate(stride);
    }

    if let Err(e) = sink.write_at(row_offset, &records).await {
        warn!(page = page_index, row = row_offset, error = %e, "page write failed, skipping");
        return PageOutcome::failed(page_index, row_offset, FailureKind::Write, e.to_string());
    }

    debug!(page = page_index, row = row_offset, records = records.len(), "page written");
    PageOutcome::written(page_index, row_offset, records.len())
}
