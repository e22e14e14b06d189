//! Sitemapper: a domain-scoped crawler that feeds an XML sitemap builder
//!
//! This crate crawls a single site breadth-first from a seed URL, admits only
//! same-host document links, and streams one result per fetch attempt to a
//! sitemap builder that writes a sitemaps.org 0.9 `urlset`.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for sitemapper operations
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] sitemap::SitemapError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// All of these are fatal and surface before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for sitemapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{CrawlHandle, CrawlResult, Crawler};
pub use output::CrawlSummary;
pub use state::WorkerState;
pub use url::AdmissionPolicy;
