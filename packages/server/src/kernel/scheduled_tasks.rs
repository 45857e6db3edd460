//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The only periodic task is job maintenance:
//! - Retry or fail jobs stuck in `pending` / `in_progress`
//! - Purge failed jobs past their retention window
//!
//! ```text
//! Scheduler (every reaper_interval)
//!     │
//!     └─► run_maintenance()
//!             ├─► reap_stale_jobs() → retry (dispatch) or fail
//!             └─► purge_expired_failures()
//! ```

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::analysis::activities::run_maintenance;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let interval = deps.settings.reaper_interval;

    let reaper_job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            if let Err(e) = run_maintenance(&deps).await {
                tracing::error!(error = %e, "Job maintenance task failed");
            }
        })
    })?;

    scheduler.add(reaper_job).await?;
    scheduler.start().await?;

    tracing::info!(
        interval_secs = interval.as_secs(),
        "Scheduled tasks started (job maintenance)"
    );
    Ok(scheduler)
}
