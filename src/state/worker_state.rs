/// Worker state definitions for the crawl pool
///
/// Each worker cycles `Idle -> Fetching -> Emitting -> RateLimitWait -> Idle`
/// until it reaches `Stopped`.
use std::fmt;

/// Represents what a single crawl worker is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting to take the next item from the frontier
    Idle,

    /// An HTTP request for the current item is in flight
    Fetching,

    /// Admitting discovered links and handing the result downstream
    Emitting,

    /// Sleeping out the per-worker rate limit
    RateLimitWait,

    /// Finished: frontier exhausted, crawl cancelled, or consumer gone
    Stopped,
}

impl WorkerState {
    /// Returns true if the worker will not do any more work
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the worker holds a taken item that has not been emitted
    pub fn holds_item(&self) -> bool {
        matches!(self, Self::Fetching | Self::Emitting)
    }

    /// Checks whether moving from `self` to `next` follows the worker cycle
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (*self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Fetching) => true,
            // An item that fails the dequeue re-check goes straight back to idle
            (Idle, Idle) => true,
            (Fetching, Emitting) => true,
            (Emitting, RateLimitWait) | (Emitting, Idle) => true,
            (RateLimitWait, Idle) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Emitting => "emitting",
            Self::RateLimitWait => "rate_limit_wait",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
