//! Sitemap generation
//!
//! Consumes successful crawl results and produces a sitemaps.org 0.9
//! `urlset` document.
//!
//! # Components
//!
//! - `SitemapBuilder`: turns crawled URLs into entries (host check, query
//!   stripping, defaults)
//! - `UrlSet` / `SitemapUrl`: the document model and its protocol limits
//! - `SitemapWriter`: XML serialization to a string or file
//! - `parse_urlset` / `validate_file`: reading an existing sitemap back

mod builder;
mod reader;
mod types;
mod writer;

pub use builder::{BuilderOptions, SitemapBuilder};
pub use reader::{parse_urlset, validate_file};
pub use types::{
    ChangeFreq, SitemapError, SitemapUrl, UrlSet, MAX_LOC_LENGTH, MAX_URLS, SITEMAP_NAMESPACE,
};
pub use writer::SitemapWriter;
