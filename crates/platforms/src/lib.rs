//! Fallback media extraction.
//!
//! When the upstream extraction API gives up on a url, the extractors here
//! scrape the platform's public pages through an ordered cascade of
//! strategies and try to recover a direct media url.

pub mod extractor;
pub mod media;
