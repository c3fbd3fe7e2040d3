//! End-to-end extraction: config → HTTP fetcher + CSV sink → coordinated run.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use scorepull_fetcher::HttpPageFetcher;
use scorepull_shared::{Result, RunConfig};
use scorepull_sink::CsvSink;

use crate::coordinator::{PaginationCoordinator, RunProgress};
use crate::report::RunReport;

/// Result of the `extract` pipeline.
#[derive(Debug)]
pub struct ExtractResult {
    /// Where the table was written.
    pub output_path: PathBuf,
    /// Per-page outcomes and totals.
    pub report: RunReport,
}

/// Run a full extraction.
///
/// Only setup can fail (invalid config, uncreatable output directory); once
/// pages are dispatched the run always completes.
#[instrument(skip_all, fields(year = config.year, pages = config.page_count))]
pub async fn extract(config: &RunConfig, progress: Arc<dyn RunProgress>) -> Result<ExtractResult> {
    config.validate()?;

    let fetcher = Arc::new(HttpPageFetcher::new(config.source.clone())?);
    let sink = Arc::new(CsvSink::create(&config.output_path)?);

    info!(
        output = %config.output_path.display(),
        concurrency = config.concurrency,
        "starting extraction"
    );

    let report = PaginationCoordinator::new(fetcher, sink)
        .with_page_size(config.source.page_size)
        .run_with_progress(
            config.page_count,
            config.year,
            config.concurrency as usize,
            progress,
        )
        .await;

    Ok(ExtractResult {
        output_path: config.output_path.clone(),
        report,
    })
}
