//! Job-level failures of an analysis run.

use serde_json::{json, Value};
use site_analysis::{CrawlError, ExtractError, FailureReport, FetchError};
use thiserror::Error;

use super::models::JobFailure;
use super::store::StoreError;

/// Why a single page produced no record. Never aborts a job.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Errors that end a job in `failed`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Crawling produced no URLs
    #[error("crawling found no internal URLs: {0}")]
    EmptyCrawl(#[from] CrawlError),

    /// Every sampled page failed or was excluded
    #[error("no page could be processed ({} failed)", .failures.len())]
    NoUsablePages { failures: Vec<FailureReport> },

    /// The synthesis service could not be reached or errored
    #[error("synthesis service unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("no structured JSON found in the synthesis reply")]
    SynthesisMissingJson { raw: String },

    #[error("synthesis reply is not valid JSON: {source}")]
    SynthesisInvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("synthesis reply lacks `{missing}`")]
    SynthesisIncomplete { missing: &'static str, raw: String },

    /// The service answered with an error object
    #[error("synthesis declined: {error}")]
    SynthesisRejected { error: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The pipeline task panicked or was aborted
    #[error("analysis aborted unexpectedly: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Stable identifier for `error_details.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::EmptyCrawl(_) => "empty_crawl",
            AnalysisError::NoUsablePages { .. } => "no_usable_pages",
            AnalysisError::SynthesisUnavailable(_) => "synthesis_unavailable",
            AnalysisError::SynthesisMissingJson { .. } => "synthesis_missing_json",
            AnalysisError::SynthesisInvalidJson { .. } => "synthesis_invalid_json",
            AnalysisError::SynthesisIncomplete { .. } => "synthesis_incomplete",
            AnalysisError::SynthesisRejected { .. } => "synthesis_rejected",
            AnalysisError::Store(_) => "store",
            AnalysisError::Internal(_) => "internal",
        }
    }

    /// Context that makes a failed job record self-explanatory.
    fn context(&self) -> Value {
        match self {
            AnalysisError::NoUsablePages { failures } => json!({ "failures": failures }),
            AnalysisError::SynthesisMissingJson { raw }
            | AnalysisError::SynthesisInvalidJson { raw, .. }
            | AnalysisError::SynthesisIncomplete { raw, .. } => json!({ "raw_reply": raw }),
            AnalysisError::SynthesisRejected { error, reason } => {
                json!({ "error": error, "reason": reason })
            }
            _ => Value::Null,
        }
    }

    pub fn to_failure(&self) -> JobFailure {
        JobFailure {
            message: self.to_string(),
            details: json!({
                "kind": self.kind(),
                "message": self.to_string(),
                "context": self.context(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_page_reports() {
        let err = AnalysisError::NoUsablePages {
            failures: vec![FailureReport::new("https://example.com", "HTTP 500")],
        };
        let failure = err.to_failure();

        assert_eq!(failure.message, "no page could be processed (1 failed)");
        assert_eq!(failure.details["kind"], "no_usable_pages");
        assert_eq!(
            failure.details["context"]["failures"][0]["url"],
            "https://example.com"
        );
    }
}
