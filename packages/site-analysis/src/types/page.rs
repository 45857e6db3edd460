//! Page-level records produced by the extractors.

use serde::{Deserialize, Serialize};

/// Which extractor produced a [`PageRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Deterministic DOM walk
    #[default]
    Structural,
    /// LLM-based extraction
    Semantic,
}

/// A typed block of content inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Paragraph { text: String },
    List { items: Vec<String> },
    Subheading { text: String },
}

/// A heading and the blocks that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
}

/// Structured content of one page.
///
/// Every field is always present when serialized, empty strings and lists
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub h1: String,
    #[serde(default)]
    pub intro_content: Vec<String>,
    #[serde(default)]
    pub content_structure: Vec<Section>,
    #[serde(default)]
    pub parsing_method: ExtractionMethod,
}

impl PageRecord {
    /// Create an empty record for a URL.
    pub fn new(url: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            url: url.into(),
            parsing_method: method,
            ..Default::default()
        }
    }

    /// True when the record carries no content at all.
    pub fn is_empty(&self) -> bool {
        self.page_title.is_empty()
            && self.meta_description.is_empty()
            && self.h1.is_empty()
            && self.intro_content.is_empty()
            && self.content_structure.is_empty()
    }
}

/// A page that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub url: String,
    pub error: String,
}

impl FailureReport {
    pub fn new(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            error: error.to_string(),
        }
    }
}

/// Why a page was left out of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCategory {
    /// Member of a large collection that was not sampled
    Redundant,
    /// Hosted on a subdomain that carries no marketing content
    Irrelevant,
}

/// A page deliberately not analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub url: String,
    pub category: ExclusionCategory,
    pub reason: String,
}
