//! Per-page pipeline: sampling, confidence scoring and structural extraction.

pub mod document;
pub mod sampling;
pub mod scoring;
pub mod structural;

pub use document::ParsedDocument;
pub use sampling::{group_by_collection, sample_collections, SampledUrls};
pub use scoring::{choose_method, confidence_score, PageMetrics};
pub use structural::{extract_structure, ContentElement};
