//! Analysis worker
//!
//! Runs the worker pool and the maintenance scheduler until Ctrl-C.
//!
//! ```text
//! analyzer [URL [USER_ID]]
//! ```
//!
//! With a URL argument, a job for that site is submitted on startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::domains::analysis::activities::submit_analysis;
use server_core::domains::analysis::SqliteJobStore;
use server_core::kernel::{
    start_scheduler, ChannelDispatcher, LlmClient, LlmSemanticExtractor, LlmSynthesisService,
    ServerDeps, WorkerPool, DEFAULT_QUEUE_CAPACITY,
};
use server_core::Config;
use site_analysis::HttpFetcher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CLI_USER_ID: &str = "cli";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,site_analysis=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting website analyzer");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let settings = Arc::new(config.analysis.clone());
    tracing::info!(
        max_pages = settings.crawl.max_pages,
        threshold = settings.scorer.threshold,
        workers = settings.worker_count,
        "Configuration loaded"
    );

    // Database setup (migrations run on connect)
    let store = SqliteJobStore::new(&config.database_url)
        .await
        .context("Failed to open job store")?;
    tracing::info!("Job store ready");

    // External services
    let fetcher = HttpFetcher::from_config(&settings.crawl).context("Failed to build HTTP client")?;
    let llm = Arc::new(LlmClient::new(&config.llm).context("Failed to build LLM client")?);

    let (dispatcher, receiver) = ChannelDispatcher::channel(DEFAULT_QUEUE_CAPACITY);
    let deps = ServerDeps::new(
        Arc::new(store),
        Arc::new(fetcher),
        Arc::new(LlmSemanticExtractor::new(llm.clone())),
        Arc::new(LlmSynthesisService::new(llm)),
        Arc::new(dispatcher),
        settings.clone(),
    );

    // Workers and maintenance
    let shutdown = CancellationToken::new();
    let pool = WorkerPool::start(
        receiver,
        deps.clone(),
        settings.worker_count,
        shutdown.clone(),
    );
    let mut scheduler = start_scheduler(deps.clone())
        .await
        .context("Failed to start scheduler")?;

    let mut args = std::env::args().skip(1);
    if let Some(url) = args.next() {
        let user_id = args.next().unwrap_or_else(|| CLI_USER_ID.to_string());
        let job = submit_analysis(&url, &user_id, None, &deps)
            .await
            .with_context(|| format!("Failed to submit {url}"))?;
        tracing::info!(job_id = %job.job_id, url = %job.url, "Submitted analysis job");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
    }
    pool.shutdown().await;

    tracing::info!("Website analyzer stopped");
    Ok(())
}
