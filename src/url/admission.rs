use crate::url::host_key;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Path suffixes that never point at an HTML document
const NON_CONTENT_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".ico", ".svg",
    // styles and scripts
    ".css", ".js",
    // documents
    ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx",
    // archives and binaries
    ".zip", ".tar", ".gz", ".rar", ".exe",
    // media
    ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".flv",
    // fonts
    ".woff", ".woff2", ".ttf", ".eot",
];

/// Decides whether a discovered URL may enter the frontier
///
/// Rules are applied in order and the first failing rule rejects:
///
/// 1. Scheme is `http` or `https`
/// 2. Host (and explicit port) equals the base host exactly
/// 3. Path does not end in a non-document extension
/// 4. URL matches no exclude pattern
/// 5. If include patterns exist, URL matches at least one
///
/// Patterns are compiled once here, so a malformed expression is reported
/// before the crawl starts.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    base_host: String,
    exclude: Vec<Regex>,
    include: Vec<Regex>,
}

impl AdmissionPolicy {
    /// Builds a policy scoped to the host of `base_url`
    ///
    /// # Returns
    ///
    /// * `Ok(AdmissionPolicy)` - All patterns compiled
    /// * `Err(ConfigError)` - Base URL has no host, or a pattern is malformed
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::url::AdmissionPolicy;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/").unwrap();
    /// let policy = AdmissionPolicy::new(&base, &["/admin/.*".to_string()], &[]).unwrap();
    ///
    /// assert!(policy.is_admissible(&Url::parse("https://example.com/about").unwrap()));
    /// assert!(!policy.is_admissible(&Url::parse("https://example.com/admin/users").unwrap()));
    /// assert!(!policy.is_admissible(&Url::parse("https://other.com/").unwrap()));
    /// ```
    pub fn new(
        base_url: &Url,
        exclude_patterns: &[String],
        include_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        let base_host = host_key(base_url).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("Base URL '{}' has no host", base_url))
        })?;

        Ok(Self {
            base_host,
            exclude: compile_patterns(exclude_patterns)?,
            include: compile_patterns(include_patterns)?,
        })
    }

    /// Returns the host every admitted URL must share
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Returns true if the URL passes every admission rule
    pub fn is_admissible(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if host_key(url).as_deref() != Some(self.base_host.as_str()) {
            return false;
        }

        if is_non_content_path(url.path()) {
            return false;
        }

        let url_str = url.as_str();

        if self.exclude.iter().any(|pattern| pattern.is_match(url_str)) {
            return false;
        }

        if !self.include.is_empty() && !self.include.iter().any(|p| p.is_match(url_str)) {
            return false;
        }

        true
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!("'{}': {}", pattern, e))
            })
        })
        .collect()
}

/// Checks whether a path points at a non-HTML resource
fn is_non_content_path(path: &str) -> bool {
    let path = path.to_lowercase();
    NON_CONTENT_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(ext))
}
