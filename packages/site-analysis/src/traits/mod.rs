//! Trait seams for network access and semantic extraction.

pub mod extractor;
pub mod fetcher;
