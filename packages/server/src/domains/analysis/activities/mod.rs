//! Analysis domain activities - business logic functions
//!
//! Activities take their inputs plus `&ServerDeps` and are called by the
//! binary, the worker pool and the scheduler.

pub mod reaper;
pub mod run_analysis;
pub mod submit;

pub use reaper::{purge_expired_failures, reap_stale_jobs, run_maintenance, ReapReport};
pub use run_analysis::{analyze_site, process_page, run_analysis, RunOutcome};
pub use submit::{delete_job_for_owner, get_job, list_jobs_for_user, submit_analysis, SubmitError};
