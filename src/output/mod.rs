//! Output module for crawl progress and summaries
//!
//! This module handles:
//! - Lock-free counters updated once per crawl result
//! - The in-place progress line shown while crawling
//! - The final summary printed after the sitemap is written

mod progress;
pub mod stats;

pub use progress::Progress;
pub use stats::{format_duration, print_summary, CrawlStats, CrawlSummary};
