//! Site analysis library
//!
//! Discovers the internal pages of a website and turns them into structured
//! page records, ready for downstream synthesis.
//!
//! # Pipeline
//!
//! ```text
//! start URL
//!     │
//!     ├─► robots.txt ──► RobotsPolicy
//!     └─► SiteCrawler (BFS) ──► CrawlResult
//!             └─► sample_collections ──► selected URLs + exclusions
//!                     └─► per page: confidence_score
//!                             ├─► ≥ threshold: extract_structure
//!                             └─► < threshold: SemanticExtractor
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use site_analysis::{CrawlConfig, HttpFetcher, SiteCrawler};
//!
//! let config = CrawlConfig::default().with_max_pages(20);
//! let crawler = SiteCrawler::new(HttpFetcher::from_config(&config)?, config);
//! let result = crawler.crawl("https://example.com").await?;
//! ```
//!
//! # Modules
//!
//! - [`crawlers`] - Robots policy, HTTP fetcher, site crawler
//! - [`pipeline`] - Sampling, scoring and structural extraction
//! - [`traits`] - Fetcher and semantic extractor seams
//! - [`types`] - Configuration and record types
//! - [`testing`] - Mock implementations for testing

pub mod crawlers;
pub mod error;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{CrawlError, ExtractError, ExtractResult, FetchError, FetchResult};
pub use traits::{
    extractor::SemanticExtractor,
    fetcher::{FetchedPage, PageFetcher},
};
pub use types::{
    config::{CrawlConfig, RatioPenalty, SamplingConfig, ScorerConfig, DEFAULT_USER_AGENT},
    crawl::CrawlResult,
    page::{
        ContentBlock, ExclusionCategory, ExclusionRecord, ExtractionMethod, FailureReport,
        PageRecord, Section,
    },
};

pub use crawlers::{fetch_robots_policy, HttpFetcher, RobotsPolicy, RobotsTxt, SiteCrawler};
pub use pipeline::{
    choose_method, confidence_score, extract_structure, sample_collections, SampledUrls,
};
