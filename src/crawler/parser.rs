//! HTML link extraction
//!
//! Pulls outbound references from a fetched page:
//! - Every `<a href="...">`
//! - `<link href="...">` whose `rel` is `canonical` or `alternate`
//!
//! Each reference goes through [`normalize_link`] and the result is
//! deduplicated in order of first appearance.

use crate::url::{dedup_preserving_order, normalize_link};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// `rel` tokens that make a `<link>` element worth following
const FOLLOWED_LINK_RELS: &[&str] = &["canonical", "alternate"];

/// Extracts all followable links from an HTML document
///
/// Links are returned in document order with duplicates removed. No host or
/// extension filtering happens here; that is the admission policy's job.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - URL the document was fetched from, used to resolve relative links
///
/// # Example
///
/// ```
/// use sitemapper::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a">A</a><a href="/a#top">A again</a><a href="/b">B</a>"#;
/// let page = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &page);
///
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].as_str(), "https://example.com/a");
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    // Both element kinds share one selector so document order is preserved
    let selector = match Selector::parse("a[href], link[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let links = document
        .select(&selector)
        .filter(is_followable)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| normalize_link(href, page_url))
        .collect();

    dedup_preserving_order(links)
}

fn is_followable(element: &ElementRef<'_>) -> bool {
    match element.value().name() {
        "a" => true,
        "link" => element.value().attr("rel").map_or(false, |rel| {
            rel.split_ascii_whitespace().any(|token| {
                FOLLOWED_LINK_RELS
                    .iter()
                    .any(|wanted| token.eq_ignore_ascii_case(wanted))
            })
        }),
        _ => false,
    }
}
