//! Configuration module for sitemapper
//!
//! `CrawlConfig` is the explicit, immutable value a crawl runs with. It starts
//! from defaults, takes overrides from an optional TOML file, and finally from
//! command-line flags.
//!
//! # Example
//!
//! ```
//! use sitemapper::config::CrawlConfig;
//! use std::time::Duration;
//!
//! let config = CrawlConfig::new("https://example.com/")
//!     .unwrap()
//!     .with_max_depth(2)
//!     .with_rate_limit(Duration::from_millis(200));
//! assert_eq!(config.max_depth, 2);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{CrawlConfig, CrawlerSection, FileConfig, SitemapSection, DEFAULT_USER_AGENT};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, MAX_CONCURRENCY};
