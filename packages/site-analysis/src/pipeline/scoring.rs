//! Confidence scoring: how reliably can markup be structured without a model?

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::pipeline::document::{self, ParsedDocument};
use crate::types::config::ScorerConfig;
use crate::types::page::ExtractionMethod;

static SEMANTIC: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, li, article, section, blockquote")
        .expect("valid semantic selector")
});
static DIV: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid div selector"));
static ANY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("*").expect("valid selector"));

/// Raw measurements behind a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub semantic_ratio: f64,
    pub text_to_tag_ratio: f64,
    pub body_size: usize,
}

impl PageMetrics {
    /// Measure the body of `markup` with boilerplate removed.
    ///
    /// `None` when the input is blank or has no body.
    pub fn measure(markup: &str) -> Option<Self> {
        if markup.trim().is_empty() {
            return None;
        }

        let mut doc = ParsedDocument::parse(markup);
        doc.strip_boilerplate();
        let body = doc.body()?;

        let semantic_count = document::count(body, &SEMANTIC);
        let div_count = document::count(body, &DIV);
        let element_count = document::count(body, &ANY);
        let text_len = document::element_text(body).chars().count();

        Some(Self {
            semantic_ratio: semantic_count as f64 / (div_count + 1) as f64,
            text_to_tag_ratio: text_len as f64 / (element_count + 1) as f64,
            body_size: body.html().chars().count(),
        })
    }
}

/// Score `markup` between 0 and 100.
pub fn confidence_score(markup: &str, config: &ScorerConfig) -> u32 {
    PageMetrics::measure(markup)
        .map(|metrics| score_metrics(&metrics, config))
        .unwrap_or(0)
}

/// Apply the penalty rules to measured metrics.
pub fn score_metrics(metrics: &PageMetrics, config: &ScorerConfig) -> u32 {
    let mut penalty = config.semantic_ratio.penalty_for(metrics.semantic_ratio)
        + config.text_to_tag_ratio.penalty_for(metrics.text_to_tag_ratio);
    if metrics.body_size < config.min_body_size {
        penalty += config.small_body_penalty;
    }
    100u32.saturating_sub(penalty)
}

/// Pick the extractor for a score.
pub fn choose_method(score: u32, config: &ScorerConfig) -> ExtractionMethod {
    if score >= config.threshold {
        ExtractionMethod::Structural
    } else {
        ExtractionMethod::Semantic
    }
}
