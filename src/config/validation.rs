use crate::config::types::{CrawlConfig, FileConfig, SitemapSection};
use crate::sitemap::ChangeFreq;
use crate::ConfigError;
use std::time::Duration;

/// Shortest request timeout accepted
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest worker pool accepted
pub const MAX_CONCURRENCY: usize = 1024;

/// Validates a crawl configuration
///
/// Filter patterns are checked when the admission policy compiles them.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_base_url(config)?;

    // max_depth >= 0 and rate_limit >= 0 are guaranteed by their types

    if config.max_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be at least 1, got {}",
            config.max_concurrency
        )));
    }

    if config.max_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "max_concurrency cannot exceed {}, got {}",
            MAX_CONCURRENCY, config.max_concurrency
        )));
    }

    if config.request_timeout < MIN_REQUEST_TIMEOUT {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be at least 1 second, got {:?}",
            config.request_timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed URL: http(s) with a host
fn validate_base_url(config: &CrawlConfig) -> Result<(), ConfigError> {
    let url = &config.base_url;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Base URL '{}' must use http or https",
            url
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(format!(
            "Base URL '{}' has no host",
            url
        ))),
    }
}

/// Validates the parts of a configuration file that are not crawl settings
pub fn validate_file(config: &FileConfig) -> Result<(), ConfigError> {
    validate_sitemap_section(&config.sitemap)
}

fn validate_sitemap_section(section: &SitemapSection) -> Result<(), ConfigError> {
    if let Some(freq) = &section.changefreq {
        freq.parse::<ChangeFreq>()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
    }

    if let Some(priority) = section.priority {
        if !(0.0..=1.0).contains(&priority) {
            return Err(ConfigError::Validation(format!(
                "priority must be between 0.0 and 1.0, got {}",
                priority
            )));
        }
    }

    if let Some(output) = &section.output {
        if output.is_empty() {
            return Err(ConfigError::Validation(
                "output path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
