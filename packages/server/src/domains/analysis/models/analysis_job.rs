//! Analysis job model and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::synthesis::{AnalysisResult, DetailedCriterion, ExclusionCriterion, OpportunityAnalysis};

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A status change the lifecycle does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// pending → in_progress → completed | failed. Nothing else.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::InProgress)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::InProgress, JobStatus::Failed)
        )
    }

    /// Validate a transition, returning the new status.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(anyhow::anyhow!("unknown job status: {other}")),
        }
    }
}

// ============================================================================
// Job Model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct AnalysisJob {
    #[builder(default = Uuid::new_v4())]
    pub job_id: Uuid,
    pub user_id: String,
    pub url: String,

    #[builder(default)]
    pub status: JobStatus,
    #[builder(default = 0)]
    pub retry_count: i32,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub finished_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub notes: Option<String>,

    // Results
    #[builder(default, setter(strip_option))]
    pub opportunity_analysis: Option<OpportunityAnalysis>,
    #[builder(default, setter(strip_option))]
    pub full_text_analysis: Option<String>,
    #[builder(default)]
    pub exclusion_analysis: Vec<ExclusionCriterion>,
    #[builder(default)]
    pub detailed_analysis: Vec<DetailedCriterion>,
    #[builder(default)]
    pub actionable_recommendations: Vec<String>,

    // Error tracking
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    #[builder(default, setter(strip_option))]
    pub error_details: Option<serde_json::Value>,
}

impl AnalysisJob {
    /// Create a pending job for a URL.
    pub fn new(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::builder().user_id(user_id).url(url).build()
    }

    /// `finished_at` is set exactly when the status is terminal.
    pub fn is_consistent(&self) -> bool {
        self.status.is_terminal() == self.finished_at.is_some()
    }

    /// Append a line to the job notes.
    pub fn append_note(&mut self, note: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note.to_string(),
        });
    }

    /// Apply a successful result.
    pub fn complete(&mut self, result: AnalysisResult, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.status = self.status.transition(JobStatus::Completed)?;
        self.opportunity_analysis = Some(result.opportunity_analysis);
        self.full_text_analysis = Some(result.full_text_analysis);
        self.exclusion_analysis = result.exclusion_analysis;
        self.detailed_analysis = result.detailed_analysis;
        self.actionable_recommendations = result.actionable_recommendations;
        self.finished_at = Some(at);
        Ok(())
    }
}

/// Failure description written with a `failed` status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Human-readable summary
    pub message: String,
    /// Error kind plus whatever context explains the failure
    pub details: serde_json::Value,
}
