use crate::sitemap::types::{SitemapError, SitemapUrl, UrlSet, SITEMAP_NAMESPACE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes a [`UrlSet`] as sitemaps.org 0.9 XML
#[derive(Debug, Clone, Copy)]
pub struct SitemapWriter {
    indent: bool,
}

impl Default for SitemapWriter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SitemapWriter {
    /// Creates a writer; `indent` pretty-prints with two spaces
    pub fn new(indent: bool) -> Self {
        Self { indent }
    }

    /// Validates and renders the set into a string
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::sitemap::{SitemapUrl, SitemapWriter, UrlSet};
    ///
    /// let urlset = UrlSet { urls: vec![SitemapUrl::new("https://example.com/")] };
    /// let xml = SitemapWriter::new(false).write_to_string(&urlset).unwrap();
    ///
    /// assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    /// assert!(xml.contains("<loc>https://example.com/</loc>"));
    /// ```
    pub fn write_to_string(&self, urlset: &UrlSet) -> Result<String, SitemapError> {
        let mut buffer = Vec::new();
        self.write(urlset, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SitemapError::Xml(e.to_string()))
    }

    /// Validates and writes the set to `path`, creating parent directories
    pub fn write_to_file(&self, urlset: &UrlSet, path: &Path) -> Result<(), SitemapError> {
        urlset.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = BufWriter::new(fs::File::create(path)?);
        self.write(urlset, &mut file)?;
        file.flush()?;

        tracing::debug!("Wrote {} sitemap entries to {}", urlset.len(), path.display());
        Ok(())
    }

    /// Validates and writes the set to any byte sink
    pub fn write<W: Write>(&self, urlset: &UrlSet, inner: W) -> Result<(), SitemapError> {
        urlset.validate()?;

        let mut writer = if self.indent {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("urlset");
        root.push_attribute(("xmlns", SITEMAP_NAMESPACE));
        writer.write_event(Event::Start(root))?;

        for url in &urlset.urls {
            write_url(&mut writer, url)?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        // Trailing newline after the root element
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

fn write_url<W: Write>(writer: &mut Writer<W>, url: &SitemapUrl) -> Result<(), SitemapError> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;

    write_text_element(writer, "loc", &url.loc)?;

    if let Some(lastmod) = &url.lastmod {
        write_text_element(writer, "lastmod", lastmod)?;
    }

    if let Some(freq) = url.changefreq {
        write_text_element(writer, "changefreq", freq.as_str())?;
    }

    if let Some(priority) = url.priority {
        write_text_element(writer, "priority", &format!("{:.1}", priority))?;
    }

    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), SitemapError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
