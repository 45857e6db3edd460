pub mod analysis_job;
pub mod synthesis;

pub use analysis_job::{AnalysisJob, JobFailure, JobStatus, TransitionError};
pub use synthesis::{
    extract_json_object, AnalysisResult, Classification, DetailedCriterion, ExclusionCriterion,
    OpportunityAnalysis, PrimaryWeakness, SynthesisInput,
};
