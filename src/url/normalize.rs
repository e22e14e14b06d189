use url::Url;

/// Turns a raw `href` found on a page into an absolute URL
///
/// # Normalization Steps
///
/// 1. Drop the fragment (everything from the first `#`)
/// 2. Skip empty references and `javascript:` pseudo-links
/// 3. Resolve relative references against the page URL
/// 4. Scheme-relative references (`//host/x`) take the page's scheme, so the
///    result always carries an explicit one
///
/// Returns `None` when the reference should be ignored. Scheme, host and
/// extension filtering happen later in the admission policy.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemapper::url::normalize_link;
///
/// let page = Url::parse("https://example.com/a/").unwrap();
/// let link = normalize_link("relative/path#top", &page).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/a/relative/path");
/// ```
pub fn normalize_link(raw: &str, page_url: &Url) -> Option<Url> {
    let without_fragment = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let href = without_fragment.trim();

    if href.is_empty() || is_javascript(href) {
        return None;
    }

    let mut resolved = page_url.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

fn is_javascript(href: &str) -> bool {
    href.get(..11)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("javascript:"))
}

/// Removes duplicates by exact string equality, keeping first-seen order
pub fn dedup_preserving_order(urls: Vec<Url>) -> Vec<Url> {
    let mut seen = std::collections::HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}
