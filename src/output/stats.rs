//! Crawl statistics
//!
//! Counters are updated by workers once per emitted result and read by the
//! progress display and the final summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live crawl counters shared between workers
#[derive(Debug)]
pub struct CrawlStats {
    processed: AtomicU64,
    errored: AtomicU64,
    started: Instant,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Records one fetch attempt
    pub fn record(&self, failed: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Undoes a [`CrawlStats::record`] whose result was never delivered
    pub fn retract(&self, failed: bool) {
        self.processed.fetch_sub(1, Ordering::Relaxed);
        if failed {
            self.errored.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn errored(&self) -> u64 {
        self.errored.load(Ordering::Relaxed)
    }

    /// Time since the counters were created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Takes a consistent-enough copy of the counters
    pub fn snapshot(&self) -> CrawlSummary {
        CrawlSummary {
            processed: self.processed(),
            errored: self.errored(),
            elapsed: self.elapsed(),
        }
    }
}

/// Final (or point-in-time) tally of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlSummary {
    /// Fetch attempts that produced a result
    pub processed: u64,

    /// Attempts whose result carried an error
    pub errored: u64,

    /// Wall-clock time since the crawl started
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Number of attempts that succeeded
    pub fn succeeded(&self) -> u64 {
        self.processed.saturating_sub(self.errored)
    }

    /// Share of attempts that failed, in percent
    pub fn error_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            (self.errored as f64 / self.processed as f64) * 100.0
        }
    }
}

/// Prints the final crawl tally to stdout
///
/// # Arguments
///
/// * `summary` - Counters taken after the result stream closed
/// * `sitemap_urls` - Number of entries that made it into the sitemap
/// * `cancelled` - Whether the crawl was interrupted
pub fn print_summary(summary: &CrawlSummary, sitemap_urls: usize, cancelled: bool) {
    println!("=== Crawl Summary ===\n");

    if cancelled {
        println!("Crawl interrupted; results are partial.\n");
    }

    println!("  URLs processed: {}", summary.processed);
    println!(
        "  Errors: {} ({:.1}%)",
        summary.errored,
        summary.error_rate()
    );
    println!("  Sitemap entries: {}", sitemap_urls);
    println!("  Time: {}", format_duration(summary.elapsed));
}

/// Formats a duration rounded to whole seconds, e.g. `1m05s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64().round() as u64;
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
