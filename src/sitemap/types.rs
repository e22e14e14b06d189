use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// XML namespace of a sitemaps.org 0.9 `urlset`
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Most entries one sitemap file may hold
pub const MAX_URLS: usize = 50_000;

/// Longest `loc` value allowed
pub const MAX_LOC_LENGTH: usize = 2048;

/// Errors raised while building, validating, reading or writing a sitemap
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("URL {0} is not on the sitemap's host")]
    ForeignHost(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Sitemap must contain at least one URL")]
    Empty,

    #[error("Sitemap cannot contain more than {} URLs, got {0}", MAX_URLS)]
    TooManyUrls(usize),

    #[error("URL location cannot exceed {} characters: {0}", MAX_LOC_LENGTH)]
    LocTooLong(String),

    #[error("URL priority must be between 0.0 and 1.0, got {priority} for {loc}")]
    InvalidPriority { loc: String, priority: f64 },

    #[error("Invalid change frequency: {0}")]
    InvalidChangeFreq(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for SitemapError {
    fn from(e: quick_xml::Error) -> Self {
        SitemapError::Xml(e.to_string())
    }
}

/// How often a page is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFreq {
    type Err = SitemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(SitemapError::InvalidChangeFreq(s.to_string())),
        }
    }
}

/// One `<url>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    /// Absolute page URL
    pub loc: String,

    /// Last modification date as `YYYY-MM-DD`
    pub lastmod: Option<String>,

    pub changefreq: Option<ChangeFreq>,

    pub priority: Option<f64>,

    /// Full timestamp used for ordering; not written out
    pub last_modified: Option<DateTime<Utc>>,
}

impl SitemapUrl {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            changefreq: None,
            priority: None,
            last_modified: None,
        }
    }

    fn validate(&self) -> Result<(), SitemapError> {
        if self.loc.is_empty() {
            return Err(SitemapError::InvalidUrl(
                "URL location cannot be empty".to_string(),
            ));
        }

        if self.loc.len() > MAX_LOC_LENGTH {
            return Err(SitemapError::LocTooLong(self.loc.clone()));
        }

        if let Some(priority) = self.priority {
            if !(0.0..=1.0).contains(&priority) {
                return Err(SitemapError::InvalidPriority {
                    loc: self.loc.clone(),
                    priority,
                });
            }
        }

        Ok(())
    }
}

/// Root `<urlset>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlSet {
    pub urls: Vec<SitemapUrl>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Checks the set against the sitemap protocol limits
    pub fn validate(&self) -> Result<(), SitemapError> {
        if self.urls.is_empty() {
            return Err(SitemapError::Empty);
        }

        if self.urls.len() > MAX_URLS {
            return Err(SitemapError::TooManyUrls(self.urls.len()));
        }

        self.urls.iter().try_for_each(SitemapUrl::validate)
    }

    /// Orders entries newest first; entries without a timestamp go last
    pub fn sort_by_last_modified(&mut self) {
        self.urls
            .sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    }
}
