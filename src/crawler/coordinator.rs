//! Crawler coordinator - worker pool orchestration
//!
//! This module contains the crawl loop that coordinates all workers,
//! including:
//! - Seeding the frontier with the base URL
//! - Running a fixed pool of workers against the shared frontier
//! - Admitting discovered links at depth + 1
//! - Emitting exactly one result per fetch attempt through a bounded channel
//! - Per-worker rate limiting and cooperative cancellation

use crate::config::{validate, CrawlConfig};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchError, Page};
use crate::crawler::frontier::{Frontier, WorkItem};
use crate::output::{CrawlStats, CrawlSummary};
use crate::state::WorkerState;
use crate::url::AdmissionPolicy;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome record of one fetch attempt, success or failure
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// URL that was fetched
    pub url: Url,

    /// Last modification time reported by the server, or the fetch time
    pub last_modified: DateTime<Utc>,

    /// Number of link hops from the seed
    pub depth: u32,

    /// Set when the fetch failed
    pub error: Option<FetchError>,

    /// Final HTTP status, if a response was received
    pub status_code: Option<u16>,

    /// Time spent fetching and parsing
    pub elapsed: Duration,
}

impl CrawlResult {
    fn from_page(page: Page, elapsed: Duration) -> Self {
        Self {
            url: page.url,
            last_modified: page.last_modified,
            depth: page.depth,
            error: page.error,
            status_code: page.status_code,
            elapsed,
        }
    }

    /// Returns true if the page was fetched without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A validated, ready-to-run crawl over one site
///
/// Construction performs every fatal check (configuration invariants,
/// filter patterns, HTTP client setup), so a crawl that starts never fails
/// as a whole; individual pages fail on their results.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    client: Client,
}

impl Crawler {
    /// Validates the configuration and prepares the shared crawl state
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to start
    /// * `Err(MapperError)` - Invalid configuration or HTTP client failure
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sitemapper::{CrawlConfig, Crawler};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn example() -> sitemapper::Result<()> {
    /// let config = CrawlConfig::new("https://example.com/")?.with_max_depth(1);
    /// let crawler = Crawler::new(config)?;
    ///
    /// let mut handle = crawler.start(CancellationToken::new());
    /// while let Some(result) = handle.next().await {
    ///     println!("{} -> {:?}", result.url, result.status_code);
    /// }
    /// let summary = handle.finish().await;
    /// println!("{} processed, {} errors", summary.processed, summary.errored);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: CrawlConfig) -> crate::Result<Self> {
        validate(&config)?;

        let policy = AdmissionPolicy::new(
            &config.base_url,
            &config.exclude_patterns,
            &config.include_patterns,
        )?;
        let client = build_http_client(&config)?;
        let frontier = Frontier::new(Arc::new(policy), config.max_depth);

        Ok(Self {
            config: Arc::new(config),
            frontier: Arc::new(frontier),
            client,
        })
    }

    /// Configuration this crawler was built with
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Shared frontier; after a crawl it reports what was admitted
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Seeds the frontier and spawns the worker pool
    ///
    /// Must be called from within a Tokio runtime. The seen-set lives as long
    /// as the crawler, so a second call on the same crawler only fetches
    /// URLs that were never admitted before.
    pub fn start(&self, cancel: CancellationToken) -> CrawlHandle {
        let workers = self.config.max_concurrency;
        tracing::info!(
            "Starting crawl of {} with {} workers (max depth {})",
            self.config.base_url,
            workers,
            self.config.max_depth
        );

        let seeded = self
            .frontier
            .seed_and_admit(std::iter::once(self.config.base_url.clone()), 0);
        if seeded == 0 {
            tracing::warn!("Seed URL {} was not admitted", self.config.base_url);
        }

        let stats = Arc::new(CrawlStats::new());
        let (tx, rx) = mpsc::channel(workers);
        let mut tasks = JoinSet::new();

        for id in 0..workers {
            let worker = Worker {
                id,
                config: Arc::clone(&self.config),
                frontier: Arc::clone(&self.frontier),
                client: self.client.clone(),
                stats: Arc::clone(&stats),
                results: tx.clone(),
                cancel: cancel.clone(),
                state: WorkerState::Idle,
            };
            tasks.spawn(worker.run());
        }

        // The stream closes once every worker has dropped its sender
        drop(tx);

        CrawlHandle {
            results: rx,
            workers: tasks,
            stats,
            frontier: Arc::clone(&self.frontier),
            cancel,
        }
    }
}

/// Consumer side of a running crawl
///
/// Yields results until all workers have stopped and no work remains, or
/// until the crawl is cancelled.
pub struct CrawlHandle {
    results: mpsc::Receiver<CrawlResult>,
    workers: JoinSet<()>,
    stats: Arc<CrawlStats>,
    frontier: Arc<Frontier>,
    cancel: CancellationToken,
}

impl CrawlHandle {
    /// Waits for the next result; `None` once the stream is closed
    pub async fn next(&mut self) -> Option<CrawlResult> {
        self.results.recv().await
    }

    /// Live counters
    pub fn stats(&self) -> CrawlSummary {
        self.stats.snapshot()
    }

    /// Items queued and not yet taken
    pub fn outstanding(&self) -> usize {
        self.frontier.outstanding()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops consuming, waits for every worker to exit and returns the tally
    ///
    /// Results not yet consumed are discarded; workers blocked on a full
    /// stream observe the closed channel and stop. The tally counts every
    /// result accepted by the stream, including ones still buffered when it
    /// was closed; results the stream refused are not counted.
    pub async fn finish(mut self) -> CrawlSummary {
        self.results.close();

        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Crawl worker ended abnormally: {}", e);
            }
        }

        let summary = self.stats.snapshot();
        tracing::info!(
            "Crawl finished: {} processed, {} errors in {:.2}s",
            summary.processed,
            summary.errored,
            summary.elapsed.as_secs_f64()
        );
        summary
    }

    /// Drains the whole stream, then finishes
    pub async fn collect(mut self) -> (Vec<CrawlResult>, CrawlSummary) {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result);
        }
        let summary = self.finish().await;
        (results, summary)
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    client: Client,
    stats: Arc<CrawlStats>,
    results: mpsc::Sender<CrawlResult>,
    cancel: CancellationToken,
    state: WorkerState,
}

impl Worker {
    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(worker = self.id, "{} -> {}", self.state, next);
        self.state = next;
    }

    async fn run(mut self) {
        while let Some(item) = self.take_next().await {
            if !self.process(item).await {
                break;
            }
        }

        self.transition(WorkerState::Stopped);
    }

    /// Takes the next admissible item, or `None` when the worker should stop
    async fn take_next(&mut self) -> Option<WorkItem> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            let item = self.frontier.next(&self.cancel).await?;

            let within_depth = item.depth <= self.config.max_depth;
            if within_depth && self.frontier.policy().is_admissible(&item.url) {
                return Some(item);
            }

            // Dropped without a result and not counted as processed
            tracing::debug!("Skipping {} at dequeue", item.url);
            self.frontier.complete();
            self.transition(WorkerState::Idle);
        }
    }

    /// Fetches, admits links and emits one result
    ///
    /// Returns false when the worker should stop.
    async fn process(&mut self, item: WorkItem) -> bool {
        self.transition(WorkerState::Fetching);
        tracing::debug!(worker = self.id, "Fetching {} (depth {})", item.url, item.depth);

        // Not raced against cancellation: a started attempt always yields a result
        let started = Instant::now();
        let page = fetch_page(&self.client, item).await;
        let elapsed = started.elapsed();

        self.transition(WorkerState::Emitting);

        if page.is_success() && page.depth < self.config.max_depth {
            let admitted = self
                .frontier
                .seed_and_admit(page.links.iter().cloned(), page.depth + 1);
            tracing::debug!(
                "{}: {} links found, {} admitted",
                page.url,
                page.links.len(),
                admitted
            );
        }

        // Recorded before the hand-off, retracted if the stream refuses it
        let failed = page.error.is_some();
        self.stats.record(failed);
        let sent = self.results.send(CrawlResult::from_page(page, elapsed)).await;

        // Completed only after links are admitted and the result is handed off
        self.frontier.complete();

        if sent.is_err() {
            self.stats.retract(failed);
            tracing::debug!(worker = self.id, "Result stream closed");
            return false;
        }

        let rate_limit = self.config.rate_limit;
        if !rate_limit.is_zero() {
            self.transition(WorkerState::RateLimitWait);
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(rate_limit) => {}
            }
        }

        self.transition(WorkerState::Idle);
        true
    }
}
