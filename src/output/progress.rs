//! Single-line progress display
//!
//! Redraws `Processed: N URLs • Errors: M • Time: T` in place with a
//! carriage return each time a result is consumed.

use crate::output::stats::{format_duration, CrawlSummary};
use std::io::{self, Write};

/// In-place progress line on stdout
#[derive(Debug, Default)]
pub struct Progress {
    enabled: bool,
    drawn: bool,
}

impl Progress {
    /// Creates a progress line; a disabled one prints nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            drawn: false,
        }
    }

    /// Redraws the line with the given counters
    pub fn update(&mut self, summary: &CrawlSummary) {
        if !self.enabled {
            return;
        }

        let mut stdout = io::stdout().lock();
        // Trailing spaces clear leftovers from a longer previous line
        let _ = write!(stdout, "\r{}     ", render_line(summary));
        let _ = stdout.flush();
        self.drawn = true;
    }

    /// Ends the progress line so later output starts on a fresh line
    pub fn done(&mut self) {
        if self.enabled && self.drawn {
            println!();
            self.drawn = false;
        }
    }
}

fn render_line(summary: &CrawlSummary) -> String {
    format!(
        "Processed: {} URLs • Errors: {} • Time: {}",
        summary.processed,
        summary.errored,
        format_duration(summary.elapsed)
    )
}
