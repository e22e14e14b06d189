//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier with exactly-once admission
//! - HTTP fetching with redirect and `Last-Modified` handling
//! - HTML link extraction
//! - Worker pool coordination and termination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{CrawlHandle, CrawlResult, Crawler};
pub use fetcher::{build_http_client, fetch_page, parse_http_date, FetchError, Page, MAX_REDIRECTS};
pub use frontier::{Frontier, TakeOutcome, WorkItem};
pub use parser::extract_links;

use crate::config::CrawlConfig;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl and collects every result
///
/// Convenience wrapper over [`Crawler::new`] and [`Crawler::start`] for
/// callers that do not need to stream results.
///
/// # Returns
///
/// * `Ok((results, summary))` - The crawl ran to completion or cancellation
/// * `Err(MapperError)` - The configuration was rejected
pub async fn crawl(
    config: CrawlConfig,
    cancel: CancellationToken,
) -> crate::Result<(Vec<CrawlResult>, crate::CrawlSummary)> {
    let crawler = Crawler::new(config)?;
    Ok(crawler.start(cancel).collect().await)
}
