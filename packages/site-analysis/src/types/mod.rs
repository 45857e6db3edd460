//! Data types shared across the crawl and extraction pipeline.

pub mod config;
pub mod crawl;
pub mod page;
