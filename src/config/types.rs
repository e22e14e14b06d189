use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("sitemapper/", env!("CARGO_PKG_VERSION"));

/// Crawl parameters, fixed for the lifetime of one crawl
///
/// Built once (defaults, then file values, then CLI flags) and handed to
/// [`crate::crawler::Crawler::new`], which validates it before any worker starts.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Seed URL; its host bounds the crawl
    pub base_url: Url,

    /// Maximum number of link hops from the seed (0 = seed only)
    pub max_depth: u32,

    /// Number of workers fetching in parallel
    pub max_concurrency: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Minimum spacing between requests issued by a single worker
    pub rate_limit: Duration,

    /// Value of the User-Agent header
    pub user_agent: String,

    /// Whether HTTP redirects are followed (capped at 10 hops)
    pub follow_redirects: bool,

    /// Regular expressions; a matching URL is never admitted
    pub exclude_patterns: Vec<String>,

    /// Regular expressions; when non-empty a URL must match one to be admitted
    pub include_patterns: Vec<String>,
}

impl CrawlConfig {
    /// Creates a configuration with default values for the given seed URL
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::config::CrawlConfig;
    ///
    /// let config = CrawlConfig::new("https://example.com/").unwrap();
    /// assert_eq!(config.max_depth, 3);
    /// assert_eq!(config.max_concurrency, 5);
    /// ```
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            base_url,
            max_depth: 3,
            max_concurrency: 5,
            request_timeout: Duration::from_secs(10),
            rate_limit: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
        })
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, limit: Duration) -> Self {
        self.rate_limit = limit;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// Overlays the values present in a `[crawler]` file section
    pub fn merge_file(mut self, section: &CrawlerSection) -> Self {
        if let Some(depth) = section.max_depth {
            self.max_depth = depth;
        }
        if let Some(max) = section.max_concurrency {
            self.max_concurrency = max;
        }
        if let Some(ms) = section.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = section.rate_limit_ms {
            self.rate_limit = Duration::from_millis(ms);
        }
        if let Some(user_agent) = &section.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(follow) = section.follow_redirects {
            self.follow_redirects = follow;
        }
        if !section.exclude_patterns.is_empty() {
            self.exclude_patterns = section.exclude_patterns.clone();
        }
        if !section.include_patterns.is_empty() {
            self.include_patterns = section.include_patterns.clone();
        }
        self
    }
}

/// Contents of an optional TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub crawler: CrawlerSection,
    #[serde(default)]
    pub sitemap: SitemapSection,
}

/// `[crawler]` section; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlerSection {
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    #[serde(rename = "max-concurrency")]
    pub max_concurrency: Option<usize>,

    /// Request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: Option<u64>,

    /// Per-worker spacing between requests (milliseconds)
    #[serde(rename = "rate-limit-ms")]
    pub rate_limit_ms: Option<u64>,

    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,

    #[serde(rename = "follow-redirects")]
    pub follow_redirects: Option<bool>,

    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    #[serde(rename = "include-patterns", default)]
    pub include_patterns: Vec<String>,
}

/// `[sitemap]` section; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitemapSection {
    /// Output file path
    pub output: Option<String>,

    /// Default change frequency (always, hourly, daily, weekly, monthly, yearly, never)
    pub changefreq: Option<String>,

    /// Default priority in [0, 1]
    pub priority: Option<f64>,

    #[serde(rename = "strip-query")]
    pub strip_query: Option<bool>,

    #[serde(rename = "include-lastmod")]
    pub include_lastmod: Option<bool>,

    #[serde(rename = "sort-by-lastmod")]
    pub sort_by_lastmod: Option<bool>,

    /// Exact paths left out of the sitemap
    #[serde(rename = "exclude-paths", default)]
    pub exclude_paths: Vec<String>,
}
