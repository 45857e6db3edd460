//! LLM-backed synthesis service producing the site analysis report.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::llm::LlmClient;
use super::traits::BaseSynthesisService;
use crate::domains::analysis::models::SynthesisInput;

const SYNTHESIS_PROMPT: &str = r#"You are a go-to-market and positioning strategist. You assess how clearly a
company's website communicates its offer, seen through the eyes of a
potential buyer with real pain and the power to decide.

You receive structured website data:
- seiten_inhalte: extracted page records
- link_struktur: internal link map (page -> linked pages)
- parsing_fehlschlaege: pages that could not be processed
- ausgeschlossene_seiten: pages left out on purpose (collections, subdomains)

Return exactly one JSON object, with no text before or after it:

{
  "opportunity_analysis": {
    "classification": "IDEAL_PARTNER | LOW_URGENCY | HIGH_EFFORT_LOW_FIT | NOT_RELEVANT",
    "pain_score": 0-10,
    "potential_score": 0-10,
    "summary_justification": "two or three sentences",
    "primary_weakness": {"criterion": "name", "evidence_quote": "quote from the site"}
  },
  "exclusion_analysis": [
    {"criterion": "Generic Agency Problem", "triggered": false, "justification": "..."},
    {"criterion": "No Clear Problem-Solution", "triggered": false, "justification": "..."}
  ],
  "detailed_analysis": [
    {"criterion": "name", "score": 0-10, "reasoning": "...", "evidence_quote": "..."}
  ],
  "actionable_recommendations": ["concrete next step"],
  "full_text_analysis": "the complete written report"
}

If the data is insufficient for an analysis, return {"error": "...", "reason": "..."} instead."#;

pub struct LlmSynthesisService {
    client: Arc<LlmClient>,
}

impl LlmSynthesisService {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

/// Reply used when there is nothing to analyse.
pub fn no_data_reply() -> String {
    json!({
        "error": "No data to analyse.",
        "reason": "No page could be extracted and no page failures were recorded."
    })
    .to_string()
}

#[async_trait]
impl BaseSynthesisService for LlmSynthesisService {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<String> {
        if input.has_no_data() {
            return Ok(no_data_reply());
        }

        let data = serde_json::to_string_pretty(input).context("Failed to serialize site data")?;

        info!(
            pages = input.pages.len(),
            failures = input.failures.len(),
            exclusions = input.exclusions.len(),
            model = %self.client.model(),
            "Requesting site synthesis"
        );

        self.client
            .complete(SYNTHESIS_PROMPT, &data)
            .await
            .context("Synthesis request failed")
    }
}
