//! Frontier: the shared work queue and seen-set for one crawl
//!
//! This module handles:
//! - Exactly-once admission of canonical URL strings
//! - FIFO hand-out of work items (breadth-first by construction)
//! - Tracking of items taken but not yet emitted, so that a momentarily
//!   empty queue is never mistaken for the end of the crawl

use crate::url::AdmissionPolicy;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound on how long an idle worker sleeps before re-checking the queue
///
/// Wake-ups normally arrive through the notifier; this only caps the wait.
const IDLE_BACKOFF: Duration = Duration::from_millis(50);

/// A URL admitted for fetching, with its distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Absolute URL to fetch
    pub url: Url,

    /// Number of link hops from the seed URL
    pub depth: u32,
}

/// Outcome of a non-blocking attempt to take work
#[derive(Debug, PartialEq, Eq)]
pub enum TakeOutcome {
    /// An item was removed from the queue and is now counted as in flight
    Item(WorkItem),

    /// Queue is empty but other items are in flight and may add more work
    Pending,

    /// Queue is empty and nothing is in flight: the crawl is complete
    Exhausted,
}

/// Queue, seen-set and in-flight count, guarded together
#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<WorkItem>,
    seen: HashSet<String>,
    in_flight: usize,
}

/// Thread-safe crawl frontier
///
/// Every mutation goes through one mutex, so the seen-set, the queue and the
/// in-flight counter are always observed together. The crawl is finished
/// exactly when the queue is empty and the in-flight count is zero.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    policy: Arc<AdmissionPolicy>,
    max_depth: u32,
    changed: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `policy` - Admission rules applied to every candidate URL
    /// * `max_depth` - Items deeper than this are never enqueued
    pub fn new(policy: Arc<AdmissionPolicy>, max_depth: u32) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            policy,
            max_depth,
            changed: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits URLs at the given depth
    ///
    /// Each URL is enqueued only if the depth is within bounds, it passes the
    /// admission policy, and its canonical string has never been admitted
    /// before during this crawl. The canonical string never carries a
    /// fragment. Input order is preserved.
    ///
    /// # Returns
    ///
    /// The number of URLs actually enqueued
    pub fn seed_and_admit<I>(&self, urls: I, depth: u32) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        if depth > self.max_depth {
            return 0;
        }

        let mut admitted = 0;
        {
            let mut state = self.lock();
            for mut url in urls {
                url.set_fragment(None);
                if state.seen.contains(url.as_str()) || !self.policy.is_admissible(&url) {
                    continue;
                }

                state.seen.insert(url.as_str().to_string());
                state.queue.push_back(WorkItem { url, depth });
                admitted += 1;
            }
        }

        if admitted > 0 {
            tracing::trace!("Admitted {} URLs at depth {}", admitted, depth);
            self.changed.notify_waiters();
        }

        admitted
    }

    /// Removes the head item without waiting
    ///
    /// A returned item counts as in flight until [`Frontier::complete`] is called.
    pub fn try_take(&self) -> TakeOutcome {
        let mut state = self.lock();
        match state.queue.pop_front() {
            Some(item) => {
                state.in_flight += 1;
                TakeOutcome::Item(item)
            }
            None if state.in_flight > 0 => TakeOutcome::Pending,
            None => TakeOutcome::Exhausted,
        }
    }

    /// Removes the head item, or returns `None` if the queue is currently empty
    pub fn take(&self) -> Option<WorkItem> {
        match self.try_take() {
            TakeOutcome::Item(item) => Some(item),
            TakeOutcome::Pending | TakeOutcome::Exhausted => None,
        }
    }

    /// Marks one previously taken item as finished
    ///
    /// Must be called exactly once per taken item, after its links have been
    /// admitted and its result emitted.
    pub fn complete(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Waits for the next item
    ///
    /// Returns `None` when the crawl is exhausted or `cancel` fires. While the
    /// queue is empty but work is still in flight, the caller is parked until
    /// new URLs are admitted or an in-flight item completes.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<WorkItem> {
        loop {
            // Register interest before checking so a wake-up between the
            // check and the await is not lost
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_take() {
                TakeOutcome::Item(item) => return Some(item),
                TakeOutcome::Exhausted => return None,
                TakeOutcome::Pending => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
                _ = tokio::time::sleep(IDLE_BACKOFF) => {}
            }
        }
    }

    /// Number of items queued and not yet taken
    pub fn outstanding(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of items taken and not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of distinct URLs admitted over the whole crawl
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Returns true if the URL has been admitted at some point
    pub fn has_seen(&self, url: &Url) -> bool {
        self.lock().seen.contains(url.as_str())
    }

    /// Returns all admitted URLs, sorted
    pub fn seen_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.lock().seen.iter().cloned().collect();
        urls.sort();
        urls
    }

    /// Returns the admission policy this frontier enforces
    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }
}
