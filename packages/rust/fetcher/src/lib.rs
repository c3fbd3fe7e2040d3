//! Page fetching for the score listing API.
//!
//! This crate provides:
//! - [`PageFetcher`]: the seam the coordinator fetches pages through
//! - [`HttpPageFetcher`]: one-shot HTTP implementation against the upstream endpoint

pub mod http;

use async_trait::async_trait;
use scorepull_shared::{PageContent, PageRequest, Result};

pub use http::HttpPageFetcher;

/// Fetches a single page of score records.
///
/// Implementations make exactly one attempt per call. Transport failures come
/// back as [`ScorePullError::Network`](scorepull_shared::ScorePullError::Network),
/// unparsable bodies as
/// [`ScorePullError::Decode`](scorepull_shared::ScorePullError::Decode). A page
/// with no records is `Ok(PageContent::Empty)`, not an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent>;
}
