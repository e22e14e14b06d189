use crate::sitemap::types::{SitemapError, SitemapUrl, UrlSet};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

/// Child elements of `<url>` that carry a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    LastMod,
    ChangeFreq,
    Priority,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"loc" => Some(Self::Loc),
            b"lastmod" => Some(Self::LastMod),
            b"changefreq" => Some(Self::ChangeFreq),
            b"priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

/// Parses a `urlset` document
///
/// Unknown elements are ignored. A `changefreq` or `priority` value that
/// cannot be parsed is an error.
pub fn parse_urlset(xml: &str) -> Result<UrlSet, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut urlset = UrlSet::new();
    let mut saw_urlset = false;
    let mut current: Option<SitemapUrl> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"urlset" => saw_urlset = true,
                b"url" => current = Some(SitemapUrl::new(String::new())),
                name => field = Field::from_name(name),
            },
            Event::Text(t) => {
                if let (Some(url), Some(field)) = (current.as_mut(), field) {
                    let value = t.unescape()?.trim().to_string();
                    set_field(url, field, value)?;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"url" => {
                    if let Some(url) = current.take() {
                        urlset.urls.push(url);
                    }
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_urlset {
        return Err(SitemapError::Xml("missing <urlset> root element".to_string()));
    }

    Ok(urlset)
}

fn set_field(url: &mut SitemapUrl, field: Field, value: String) -> Result<(), SitemapError> {
    match field {
        Field::Loc => url.loc = value,
        Field::LastMod => url.lastmod = Some(value),
        Field::ChangeFreq => url.changefreq = Some(value.parse()?),
        Field::Priority => {
            let priority = value
                .parse::<f64>()
                .map_err(|_| SitemapError::Xml(format!("invalid priority '{}'", value)))?;
            url.priority = Some(priority);
        }
    }
    Ok(())
}

/// Reads a sitemap file and checks it against the protocol limits
///
/// # Returns
///
/// * `Ok(UrlSet)` - The file parsed and is valid
/// * `Err(SitemapError)` - Unreadable, malformed, or out of limits
pub fn validate_file(path: &Path) -> Result<UrlSet, SitemapError> {
    let content = std::fs::read_to_string(path)?;
    let urlset = parse_urlset(&content)?;
    urlset.validate()?;
    Ok(urlset)
}
