//! LLM-backed semantic extractor for pages the structural parser can't trust.

use async_trait::async_trait;
use site_analysis::{ExtractError, ExtractResult, ExtractionMethod, PageRecord, SemanticExtractor};
use std::sync::Arc;
use tracing::debug;

use super::llm::LlmClient;
use crate::domains::analysis::models::extract_json_object;

/// Upper bound on the markup sent to the model, in characters.
const MAX_HTML_CHARS: usize = 120_000;

const EXTRACTION_PROMPT: &str = r#"You are a precise web content extractor. You receive the raw HTML of a
single web page, often noisy and CMS-generated. Ignore navigation, cookie
banners, footers, chat widgets, scripts and anything else that is not the
main content a reader came for.

Return exactly one JSON object with this shape and nothing else:

{
  "url": "the page URL if known, otherwise an empty string",
  "page_title": "cleaned content of the <title> tag",
  "meta_description": "content of <meta name='description'>, empty if absent",
  "h1": "text of the main h1 heading",
  "intro_content": ["paragraphs after the h1 and before the first section heading"],
  "content_structure": [
    {
      "heading": "heading of a logical section (usually h2/h3)",
      "content_blocks": [
        {"type": "paragraph", "text": "clean paragraph text"},
        {"type": "list", "items": ["list item", "another item"]},
        {"type": "subheading", "text": "a deeper heading inside the section"}
      ]
    }
  ]
}

Rules: plain text only, no HTML tags; collapse whitespace; keep the order of
the page; omit sections without content."#;

pub struct LlmSemanticExtractor {
    client: Arc<LlmClient>,
}

impl LlmSemanticExtractor {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse a model reply into a page record for `url`.
pub fn parse_page_reply(reply: &str, url: &str) -> ExtractResult<PageRecord> {
    let json = extract_json_object(reply).ok_or(ExtractError::MissingJson)?;
    let mut record: PageRecord = serde_json::from_str(json)?;
    record.url = url.to_string();
    record.parsing_method = ExtractionMethod::Semantic;
    Ok(record)
}

#[async_trait]
impl SemanticExtractor for LlmSemanticExtractor {
    async fn extract(&self, html: &str, url: &str) -> ExtractResult<PageRecord> {
        let user_prompt = format!(
            "URL: {}\n\nHTML:\n{}",
            url,
            truncate_chars(html, MAX_HTML_CHARS)
        );

        let reply = self
            .client
            .complete(EXTRACTION_PROMPT, &user_prompt)
            .await
            .map_err(|e| ExtractError::Backend(Box::new(e)))?;

        parse_page_reply(&reply, url).inspect_err(|e| {
            debug!(
                url = %url,
                error = %e,
                prompt = %user_prompt,
                raw_reply = %reply,
                "semantic extraction reply unusable"
            );
        })
    }
}
