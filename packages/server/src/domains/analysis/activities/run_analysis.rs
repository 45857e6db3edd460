//! The job orchestrator: claim, analyse, finish.
//!
//! ```text
//! run_analysis(job_id)
//!     ├─► claim (pending → in_progress)
//!     ├─► analyze_site (spawned task)
//!     │       ├─► SiteCrawler::crawl
//!     │       ├─► sample_collections
//!     │       ├─► per URL: subdomain exclusion | process_page
//!     │       └─► synthesis → AnalysisResult::from_reply
//!     └─► complete | fail (guarded by in_progress)
//! ```

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use site_analysis::{
    choose_method, confidence_score, extract_structure, sample_collections, ExclusionCategory,
    ExclusionRecord, ExtractionMethod, FailureReport, PageRecord, SiteCrawler,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::analysis::error::{AnalysisError, PageError};
use crate::domains::analysis::models::{AnalysisResult, JobStatus, SynthesisInput};
use crate::kernel::ServerDeps;

/// How a dispatched job id was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed { kind: &'static str },
    /// Nothing to do: unknown id, already terminal, or claimed elsewhere
    Skipped,
    /// The job reached a terminal state before this run could finish it
    Superseded,
}

/// Run one job to a terminal state.
///
/// Only store errors escape; every analysis failure is written to the job.
pub async fn run_analysis(job_id: Uuid, deps: &ServerDeps) -> Result<RunOutcome, AnalysisError> {
    let Some(job) = deps.store.get(job_id).await? else {
        warn!(job_id = %job_id, "Dispatched job not found");
        return Ok(RunOutcome::Skipped);
    };

    match job.status {
        JobStatus::Pending => {
            if !deps.store.claim(job_id).await? {
                debug!(job_id = %job_id, "Job claimed by another worker");
                return Ok(RunOutcome::Skipped);
            }
        }
        JobStatus::InProgress => {
            info!(job_id = %job_id, retry_count = job.retry_count, "Re-entering in-progress job");
        }
        JobStatus::Completed | JobStatus::Failed => {
            debug!(job_id = %job_id, status = %job.status, "Job already finished");
            return Ok(RunOutcome::Skipped);
        }
    }

    info!(job_id = %job_id, url = %job.url, "Analysis started");

    // A panic inside the pipeline surfaces as a JoinError
    let task_deps = deps.clone();
    let url = job.url.clone();
    let outcome = match tokio::spawn(async move { analyze_site(&url, &task_deps).await }).await {
        Ok(result) => result,
        Err(join_error) => Err(AnalysisError::Internal(join_error.to_string())),
    };

    let finished_at = Utc::now();
    match outcome {
        Ok(result) => {
            if deps.store.complete(job_id, &result, finished_at).await? {
                info!(
                    job_id = %job_id,
                    classification = ?result.opportunity_analysis.classification,
                    "Analysis completed"
                );
                Ok(RunOutcome::Completed)
            } else {
                warn!(job_id = %job_id, "Job finished elsewhere, result discarded");
                Ok(RunOutcome::Superseded)
            }
        }
        Err(err) => {
            let failure = err.to_failure();
            if deps
                .store
                .fail(job_id, JobStatus::InProgress, &failure, finished_at)
                .await?
            {
                error!(job_id = %job_id, kind = err.kind(), error = %err, "Analysis failed");
                Ok(RunOutcome::Failed { kind: err.kind() })
            } else {
                warn!(job_id = %job_id, error = %err, "Job finished elsewhere, failure discarded");
                Ok(RunOutcome::Superseded)
            }
        }
    }
}

/// Crawl, sample, extract and synthesise one site.
pub async fn analyze_site(url: &str, deps: &ServerDeps) -> Result<AnalysisResult, AnalysisError> {
    let settings = &deps.settings;

    let crawler = SiteCrawler::new(deps.fetcher.clone(), settings.crawl.clone());
    let crawl = crawler.crawl(url).await?;
    info!(
        url = %url,
        pages = crawl.urls.len(),
        external_domains = crawl.external_domains.len(),
        "Crawl finished"
    );

    let sampled = {
        let mut rng = StdRng::from_entropy();
        sample_collections(&crawl.urls, &settings.sampling, &mut rng)
    };

    let mut exclusions = sampled.excluded;
    let mut pages: Vec<PageRecord> = Vec::new();
    let mut failures: Vec<FailureReport> = Vec::new();

    for page_url in &sampled.selected {
        if settings.is_excluded_subdomain(page_url) {
            debug!(url = %page_url, "Skipping irrelevant subdomain");
            exclusions.push(ExclusionRecord {
                url: page_url.clone(),
                category: ExclusionCategory::Irrelevant,
                reason: "Hosted on a subdomain excluded from analysis".to_string(),
            });
            continue;
        }

        match process_page(page_url, deps).await {
            Ok(record) => pages.push(record),
            Err(e) => {
                warn!(url = %page_url, error = %e, "Page processing failed");
                failures.push(FailureReport::new(page_url.as_str(), &e));
            }
        }
    }

    info!(
        url = %url,
        extracted = pages.len(),
        failed = failures.len(),
        excluded = exclusions.len(),
        "Page processing finished"
    );

    if pages.is_empty() {
        return Err(AnalysisError::NoUsablePages { failures });
    }

    let input = SynthesisInput {
        pages,
        link_map: crawl.link_map,
        failures,
        exclusions,
    };

    let reply = deps
        .synthesis
        .synthesize(&input)
        .await
        .map_err(|e| AnalysisError::SynthesisUnavailable(format!("{e:#}")))?;

    AnalysisResult::from_reply(&reply)
}

/// Fetch one page, score it and run the matching extractor.
pub async fn process_page(url: &str, deps: &ServerDeps) -> Result<PageRecord, PageError> {
    let page = deps.fetcher.fetch(url).await?;

    let score = confidence_score(&page.body, &deps.settings.scorer);
    let method = choose_method(score, &deps.settings.scorer);
    debug!(url = %url, score, method = ?method, "Page scored");

    let record = match method {
        ExtractionMethod::Structural => extract_structure(&page.body, url)?,
        ExtractionMethod::Semantic => deps.semantic_extractor.extract(&page.body, url).await?,
    };
    Ok(record)
}
