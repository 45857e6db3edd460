//! Analysis domain - website analysis jobs from submission to synthesis
//!
//! A job is submitted `pending`, claimed by a worker (`in_progress`), run
//! through crawl → sample → per-page extraction → synthesis, and finished as
//! `completed` or `failed`. The reaper resolves jobs that get stuck.

pub mod activities;
pub mod error;
pub mod models;
pub mod store;

pub use error::{AnalysisError, PageError};
pub use models::{AnalysisJob, AnalysisResult, JobFailure, JobStatus, SynthesisInput};
pub use store::{JobStore, MemoryJobStore, SqliteJobStore, StoreError};
