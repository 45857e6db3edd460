// Website Analyzer - Core
//
// This crate runs website analysis jobs: crawl a site, extract its pages,
// and have an LLM assess how clearly it communicates its offer.
// Architecture follows domain-driven design; infrastructure lives in kernel/.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
