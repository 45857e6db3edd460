//! Configuration types for crawling, scoring and sampling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User agent sent with every crawl request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for a site crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of pages admitted to the crawl.
    ///
    /// Robots-disallowed URLs do not count against it. Default: 50.
    pub max_pages: usize,

    /// Timeout applied to every request, robots.txt included.
    ///
    /// Default: 10 seconds.
    pub request_timeout: Duration,

    /// User agent for requests and robots.txt matching.
    pub user_agent: String,

    /// Upper bound for a robots.txt `Crawl-delay` honoured between fetches.
    ///
    /// `None` ignores crawl delays entirely. Default: 5 seconds.
    pub max_crawl_delay: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            request_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_crawl_delay: Some(Duration::from_secs(5)),
        }
    }
}

impl CrawlConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page budget.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the crawl-delay cap (`None` disables crawl delays).
    pub fn with_max_crawl_delay(mut self, cap: Option<Duration>) -> Self {
        self.max_crawl_delay = cap;
        self
    }
}

/// A ratio threshold pair: below `bad` costs `bad_penalty`, else below `ok`
/// costs `ok_penalty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioPenalty {
    pub bad: f64,
    pub bad_penalty: u32,
    pub ok: f64,
    pub ok_penalty: u32,
}

impl RatioPenalty {
    /// Penalty for an observed ratio. The two bands are mutually exclusive.
    pub fn penalty_for(&self, ratio: f64) -> u32 {
        if ratio < self.bad {
            self.bad_penalty
        } else if ratio < self.ok {
            self.ok_penalty
        } else {
            0
        }
    }
}

/// Thresholds and penalties for the confidence scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Semantic elements per `div`.
    pub semantic_ratio: RatioPenalty,

    /// Visible characters per element.
    pub text_to_tag_ratio: RatioPenalty,

    /// Serialized body length below which `small_body_penalty` applies.
    pub min_body_size: usize,
    pub small_body_penalty: u32,

    /// Scores at or above this go to the structural extractor. Default: 60.
    pub threshold: u32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            semantic_ratio: RatioPenalty {
                bad: 0.1,
                bad_penalty: 50,
                ok: 0.3,
                ok_penalty: 30,
            },
            text_to_tag_ratio: RatioPenalty {
                bad: 5.0,
                bad_penalty: 25,
                ok: 10.0,
                ok_penalty: 15,
            },
            min_body_size: 2000,
            small_body_penalty: 40,
            threshold: 60,
        }
    }
}

impl ScorerConfig {
    /// Set the dispatch threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the semantic ratio bands.
    pub fn with_semantic_ratio(mut self, bands: RatioPenalty) -> Self {
        self.semantic_ratio = bands;
        self
    }

    /// Set the text-to-tag ratio bands.
    pub fn with_text_to_tag_ratio(mut self, bands: RatioPenalty) -> Self {
        self.text_to_tag_ratio = bands;
        self
    }

    /// Set the small-body rule.
    pub fn with_min_body_size(mut self, min_body_size: usize, penalty: u32) -> Self {
        self.min_body_size = min_body_size;
        self.small_body_penalty = penalty;
        self
    }
}

/// Configuration for collection sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Groups larger than this are sampled. Default: 5.
    pub group_threshold: usize,

    /// Members kept from a sampled group. Default: 3.
    pub sample_size: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            group_threshold: 5,
            sample_size: 3,
        }
    }
}

impl SamplingConfig {
    pub fn with_group_threshold(mut self, threshold: usize) -> Self {
        self.group_threshold = threshold;
        self
    }

    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_bands_are_exclusive() {
        let bands = ScorerConfig::default().semantic_ratio;
        assert_eq!(bands.penalty_for(0.05), 50);
        assert_eq!(bands.penalty_for(0.1), 30);
        assert_eq!(bands.penalty_for(0.29), 30);
        assert_eq!(bands.penalty_for(0.3), 0);
    }

    #[test]
    fn crawl_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }
}
