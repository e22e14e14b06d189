use crate::config::SitemapSection;
use crate::sitemap::types::{ChangeFreq, SitemapError, SitemapUrl, UrlSet};
use crate::url::host_key;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use url::Url;

/// Controls how crawl results become sitemap entries
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderOptions {
    /// Change frequency applied to every entry
    pub default_changefreq: Option<ChangeFreq>,

    /// Priority applied to every entry
    pub default_priority: Option<f64>,

    /// Write a `<lastmod>` date for each entry
    pub include_lastmod: bool,

    /// Order entries newest first when building
    pub sort_by_lastmod: bool,

    /// Paths (exact match) that never appear in the sitemap
    pub exclude_paths: Vec<String>,

    /// Drop the query string from every URL
    pub strip_query: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            default_changefreq: Some(ChangeFreq::Weekly),
            default_priority: Some(0.5),
            include_lastmod: true,
            sort_by_lastmod: true,
            exclude_paths: Vec::new(),
            strip_query: true,
        }
    }
}

impl BuilderOptions {
    /// Overlays the values present in a `[sitemap]` file section
    pub fn merge_file(mut self, section: &SitemapSection) -> Result<Self, SitemapError> {
        if let Some(freq) = &section.changefreq {
            self.default_changefreq = Some(freq.parse()?);
        }
        if let Some(priority) = section.priority {
            self.default_priority = Some(priority);
        }
        if let Some(include) = section.include_lastmod {
            self.include_lastmod = include;
        }
        if let Some(sort) = section.sort_by_lastmod {
            self.sort_by_lastmod = sort;
        }
        if let Some(strip) = section.strip_query {
            self.strip_query = strip;
        }
        if !section.exclude_paths.is_empty() {
            self.exclude_paths = section.exclude_paths.clone();
        }
        Ok(self)
    }
}

/// Accumulates crawl results into a [`UrlSet`]
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use sitemapper::sitemap::{BuilderOptions, SitemapBuilder};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let mut builder = SitemapBuilder::new(&base, BuilderOptions::default());
///
/// builder.add_url("https://example.com/about?ref=nav", Utc::now()).unwrap();
/// assert!(builder.add_url("https://other.com/", Utc::now()).is_err());
///
/// let urlset = builder.build().unwrap();
/// assert_eq!(urlset.urls[0].loc, "https://example.com/about");
/// ```
#[derive(Debug)]
pub struct SitemapBuilder {
    base_host: Option<String>,
    options: BuilderOptions,
    urlset: UrlSet,
    locs: HashSet<String>,
}

impl SitemapBuilder {
    pub fn new(base_url: &Url, options: BuilderOptions) -> Self {
        Self {
            base_host: host_key(base_url),
            options,
            urlset: UrlSet::new(),
            locs: HashSet::new(),
        }
    }

    /// Adds one page to the sitemap
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - An entry was added
    /// * `Ok(false)` - Skipped: excluded path, or the same `loc` is already present
    /// * `Err(SitemapError)` - Unparsable URL or a host other than the base host
    pub fn add_url(
        &mut self,
        loc: &str,
        last_modified: DateTime<Utc>,
    ) -> Result<bool, SitemapError> {
        let mut url = Url::parse(loc)
            .map_err(|e| SitemapError::InvalidUrl(format!("{}: {}", loc, e)))?;

        if host_key(&url) != self.base_host {
            return Err(SitemapError::ForeignHost(loc.to_string()));
        }

        if self.options.exclude_paths.iter().any(|path| path == url.path()) {
            return Ok(false);
        }

        if self.options.strip_query {
            url.set_query(None);
        }
        url.set_fragment(None);

        // Query stripping can collapse distinct crawl URLs onto one entry
        if !self.locs.insert(url.as_str().to_string()) {
            return Ok(false);
        }

        let mut entry = SitemapUrl::new(url.as_str());
        entry.last_modified = Some(last_modified);
        if self.options.include_lastmod {
            entry.lastmod = Some(last_modified.format("%Y-%m-%d").to_string());
        }
        entry.changefreq = self.options.default_changefreq;
        entry.priority = self.options.default_priority;

        self.urlset.urls.push(entry);
        Ok(true)
    }

    /// Number of entries accumulated so far
    pub fn count(&self) -> usize {
        self.urlset.len()
    }

    /// Entries accumulated so far, in insertion order
    pub fn urls(&self) -> &[SitemapUrl] {
        &self.urlset.urls
    }

    /// Sorts (if configured), validates and returns the finished set
    pub fn build(mut self) -> Result<UrlSet, SitemapError> {
        if self.options.sort_by_lastmod {
            self.urlset.sort_by_last_modified();
        }

        self.urlset.validate()?;
        Ok(self.urlset)
    }
}
