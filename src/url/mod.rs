//! URL handling module for sitemapper
//!
//! This module provides link normalization, host scoping, and the admission
//! policy that decides which discovered URLs may be crawled.

mod admission;
mod domain;
mod normalize;

pub use admission::AdmissionPolicy;
pub use domain::host_key;
pub use normalize::{dedup_preserving_order, normalize_link};
