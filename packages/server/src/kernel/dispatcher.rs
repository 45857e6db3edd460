//! In-process job dispatch: an mpsc channel feeding a pool of workers.
//!
//! ```text
//! submit_analysis / reaper
//!     │
//!     └─► ChannelDispatcher::dispatch(job_id)
//!             └─► mpsc ──► worker 1..N ──► run_analysis(job_id)
//! ```
//!
//! Delivery is at-least-once. A duplicate id for a `pending` job loses the
//! conditional claim and is skipped. A duplicate for an `in_progress` job (a
//! reaper retry racing a slow worker) runs the analysis again; whichever run
//! finishes second loses the guarded terminal write and its result is
//! discarded.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{BaseJobDispatcher, ServerDeps};
use crate::domains::analysis::activities::run_analysis;

/// Default capacity of the dispatch channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Dispatcher backed by the worker pool's channel.
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<Uuid>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver the worker pool consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Uuid>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl BaseJobDispatcher for ChannelDispatcher {
    async fn dispatch(&self, job_id: Uuid) -> Result<()> {
        self.sender
            .send(job_id)
            .await
            .map_err(|_| anyhow!("worker pool is not running"))?;
        debug!(job_id = %job_id, "job dispatched");
        Ok(())
    }
}

/// A fixed number of workers sharing one receiver.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Spawn `worker_count` workers that run jobs until `shutdown` fires or
    /// the channel closes.
    pub fn start(
        receiver: mpsc::Receiver<Uuid>,
        deps: ServerDeps,
        worker_count: usize,
        shutdown: CancellationToken,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..worker_count.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let deps = deps.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { worker_loop(worker_id, receiver, deps, shutdown).await })
            })
            .collect();

        info!(workers = worker_count.max(1), "worker pool started");
        Self { handles, shutdown }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop accepting work and wait for the workers to finish their current job.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task ended abnormally");
            }
        }
        info!("worker pool stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Uuid>>>,
    deps: ServerDeps,
    shutdown: CancellationToken,
) {
    debug!(worker_id, "worker starting");

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            job_id = async { receiver.lock().await.recv().await } => job_id,
        };

        let Some(job_id) = next else {
            // All dispatchers dropped
            break;
        };

        match run_analysis(job_id, &deps).await {
            Ok(outcome) => debug!(worker_id, job_id = %job_id, ?outcome, "job handled"),
            Err(e) => error!(worker_id, job_id = %job_id, error = %e, "job run failed"),
        }
    }

    debug!(worker_id, "worker stopped");
}
