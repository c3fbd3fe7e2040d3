//! Run orchestration for scorepull.
//!
//! This crate ties the page fetcher and the record sink together:
//! - [`coordinator`]: bounded-concurrency pagination over a page range
//! - [`report`]: per-page outcomes and the run summary
//! - [`pipeline`]: end-to-end extraction from a [`RunConfig`](scorepull_shared::RunConfig)

pub mod coordinator;
pub mod pipeline;
pub mod report;

pub use coordinator::{PaginationCoordinator, RunProgress, SilentProgress};
pub use pipeline::{ExtractResult, extract};
pub use report::{FailureKind, PageOutcome, PageStatus, RunReport};
