//! Synthesis service contract: the input payload and the parsed reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use site_analysis::{ExclusionRecord, FailureReport, PageRecord};
use std::collections::BTreeMap;

use crate::domains::analysis::error::AnalysisError;

/// Everything the synthesis service sees about a site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisInput {
    #[serde(rename = "seiten_inhalte")]
    pub pages: Vec<PageRecord>,
    #[serde(rename = "link_struktur")]
    pub link_map: BTreeMap<String, Vec<String>>,
    #[serde(rename = "parsing_fehlschlaege")]
    pub failures: Vec<FailureReport>,
    #[serde(rename = "ausgeschlossene_seiten")]
    pub exclusions: Vec<ExclusionRecord>,
}

impl SynthesisInput {
    /// Nothing was extracted and nothing failed.
    pub fn has_no_data(&self) -> bool {
        self.pages.is_empty() && self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    IdealPartner,
    LowUrgency,
    HighEffortLowFit,
    NotRelevant,
    #[default]
    #[serde(other)]
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryWeakness {
    #[serde(default)]
    pub criterion: String,
    #[serde(default)]
    pub evidence_quote: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpportunityAnalysis {
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub pain_score: f64,
    #[serde(default)]
    pub potential_score: f64,
    #[serde(default)]
    pub summary_justification: String,
    #[serde(default)]
    pub primary_weakness: Option<PrimaryWeakness>,
}

/// A knock-out criterion and whether the site triggered it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExclusionCriterion {
    #[serde(default)]
    pub criterion: String,
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub justification: String,
}

/// A scored criterion with its evidence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedCriterion {
    #[serde(default)]
    pub criterion: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub evidence_quote: String,
}

/// The persisted parts of a synthesis reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub opportunity_analysis: OpportunityAnalysis,
    pub full_text_analysis: String,
    pub exclusion_analysis: Vec<ExclusionCriterion>,
    pub detailed_analysis: Vec<DetailedCriterion>,
    pub actionable_recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    opportunity_analysis: Option<OpportunityAnalysis>,
    full_text_analysis: Option<String>,
    #[serde(default)]
    exclusion_analysis: Vec<ExclusionCriterion>,
    #[serde(default)]
    detailed_analysis: Vec<DetailedCriterion>,
    #[serde(default)]
    actionable_recommendations: Vec<String>,
}

/// The outermost `{ ... }` span of a model reply.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

impl AnalysisResult {
    /// Parse a raw synthesis reply.
    ///
    /// The reply may wrap the JSON object in prose. An object carrying an
    /// `error` key is the service declining to analyse and is returned as
    /// [`AnalysisError::SynthesisRejected`].
    pub fn from_reply(raw: &str) -> Result<Self, AnalysisError> {
        let json = extract_json_object(raw).ok_or_else(|| AnalysisError::SynthesisMissingJson {
            raw: raw.to_string(),
        })?;

        let value: Value =
            serde_json::from_str(json).map_err(|source| AnalysisError::SynthesisInvalidJson {
                raw: raw.to_string(),
                source,
            })?;

        if let Some(error) = value.get("error") {
            return Err(AnalysisError::SynthesisRejected {
                error: value_text(error),
                reason: value
                    .get("reason")
                    .or_else(|| value.get("details"))
                    .map(value_text)
                    .unwrap_or_default(),
            });
        }

        let reply: RawReply = serde_json::from_value(value).map_err(|source| {
            AnalysisError::SynthesisInvalidJson {
                raw: raw.to_string(),
                source,
            }
        })?;

        let opportunity_analysis =
            reply
                .opportunity_analysis
                .ok_or_else(|| AnalysisError::SynthesisIncomplete {
                    missing: "opportunity_analysis",
                    raw: raw.to_string(),
                })?;

        Ok(Self {
            opportunity_analysis,
            full_text_analysis: reply.full_text_analysis.unwrap_or_else(|| raw.to_string()),
            exclusion_analysis: reply.exclusion_analysis,
            detailed_analysis: reply.detailed_analysis,
            actionable_recommendations: reply.actionable_recommendations,
        })
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
