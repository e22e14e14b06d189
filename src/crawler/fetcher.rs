//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client from the crawl configuration
//! - Redirect policy (off, or followed up to a fixed cap)
//! - `Last-Modified` extraction
//! - Error classification into [`FetchError`]
//!
//! A fetch never returns `Err`: every attempt produces a [`Page`], with the
//! failure recorded on it.

use crate::config::CrawlConfig;
use crate::crawler::frontier::WorkItem;
use crate::crawler::parser::extract_links;
use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use thiserror::Error;
use url::Url;

/// Maximum number of redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// Why a single fetch attempt failed
///
/// Recorded on the result; never aborts the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("stopped after {} redirects", MAX_REDIRECTS)]
    TooManyRedirects,

    #[error("unexpected status code: {0}")]
    HttpStatus(u16),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Outcome of fetching one URL
#[derive(Debug, Clone)]
pub struct Page {
    /// URL that was requested
    pub url: Url,

    /// Depth of the work item this page came from
    pub depth: u32,

    /// Parsed `Last-Modified`, or the fetch time when absent or unparsable
    pub last_modified: DateTime<Utc>,

    /// Outbound links in order of first appearance; empty on failure
    pub links: Vec<Url>,

    /// Set when the fetch failed
    pub error: Option<FetchError>,

    /// Final HTTP status, if a response was received at all
    pub status_code: Option<u16>,
}

impl Page {
    fn failed(item: WorkItem, error: FetchError, status_code: Option<u16>) -> Self {
        Self {
            url: item.url,
            depth: item.depth,
            last_modified: Utc::now(),
            links: Vec::new(),
            error: Some(error),
            status_code,
        }
    }

    /// Returns true if the page was fetched and parsed
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Builds the HTTP client shared by all workers
///
/// The client carries the user agent, the per-request timeout and the
/// redirect policy. With redirects disabled the first 3xx response is
/// returned as-is and therefore reported as a non-200 status.
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::CrawlConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let config = CrawlConfig::new("https://example.com/").unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    let redirect = if config.follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout)
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one work item and extracts its links
///
/// # Request Flow
///
/// 1. Send one GET request
/// 2. Read `Last-Modified` from whatever response arrived
/// 3. Any final status other than 200 is a failure; the body is not read
/// 4. Read the body and extract links from it
///
/// | Condition | Recorded error |
/// |-----------|----------------|
/// | Request timeout | `Timeout` |
/// | Connection refused / DNS / TLS | `Connect` |
/// | Redirect chain > 10 | `TooManyRedirects` |
/// | Final status != 200 | `HttpStatus(code)` |
/// | Body could not be read | `Body` |
pub async fn fetch_page(client: &Client, item: WorkItem) -> Page {
    let response = match client.get(item.url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = FetchError::from_reqwest(&e);
            tracing::debug!("Fetch of {} failed: {}", item.url, error);
            return Page::failed(item, error, e.status().map(|s| s.as_u16()));
        }
    };

    let status = response.status();
    let last_modified = parse_last_modified(&response).unwrap_or_else(Utc::now);

    if status != StatusCode::OK {
        tracing::debug!("Fetch of {} returned HTTP {}", item.url, status.as_u16());
        let code = status.as_u16();
        let mut page = Page::failed(item, FetchError::HttpStatus(code), Some(code));
        page.last_modified = last_modified;
        return page;
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let error = FetchError::Body(e.to_string());
            let mut page = Page::failed(item, error, Some(status.as_u16()));
            page.last_modified = last_modified;
            return page;
        }
    };

    // Relative links resolve against the requested URL
    let links = extract_links(&body, &item.url);

    Page {
        url: item.url,
        depth: item.depth,
        last_modified,
        links,
        error: None,
        status_code: Some(status.as_u16()),
    }
}

fn parse_last_modified(response: &Response) -> Option<DateTime<Utc>> {
    let value = response.headers().get(LAST_MODIFIED)?.to_str().ok()?;
    parse_http_date(value)
}

/// Parses an HTTP date such as `Wed, 21 Oct 2015 07:28:00 GMT`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
