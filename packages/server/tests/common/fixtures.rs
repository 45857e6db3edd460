//! Test fixtures: site markup and job records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use server_core::domains::analysis::models::{AnalysisJob, JobFailure, JobStatus};
use server_core::domains::analysis::store::JobStore;
use serde_json::json;
use site_analysis::testing::MockFetcher;

pub const SITE: &str = "https://acme.example";

/// A semantic, text-dense page with enough body to route structurally.
pub fn rich_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a> "#))
        .collect();
    let sections: String = (1..=10)
        .map(|i| {
            format!(
                "<section><h2>{title} topic {i}</h2>\
                 <p>Our team explains topic {i} in plain language so that every visitor \
                 understands what we offer, who it is for and how to get started today.</p>\
                 <ul><li>First benefit of topic {i}</li><li>Second benefit of topic {i}</li></ul>\
                 </section>"
            )
        })
        .collect();

    format!(
        r#"<html><head><title>{title}</title>
        <meta name="description" content="{title} description"></head>
        <body><nav>{anchors}</nav>
        <main><article><h1>{title}</h1>
        <p>{title} introduction paragraph with enough words to read as real prose for visitors.</p>
        {sections}</article></main>
        <footer>Footer</footer></body></html>"#
    )
}

/// Deeply nested div soup with almost no semantic markup.
pub fn div_soup_page() -> String {
    let cells: String = (0..60)
        .map(|i| format!(r#"<div class="c{i}"><div><span>x</span></div></div>"#))
        .collect();
    format!("<html><head><title>Soup</title></head><body>{cells}</body></html>")
}

/// Home links to /about and /pricing; /pricing is div soup.
pub fn three_page_site() -> MockFetcher {
    MockFetcher::new()
        .with_page(SITE, rich_page("Home", &["/about", "/pricing"]))
        .with_page(format!("{SITE}/about"), rich_page("About", &["/"]))
        .with_page(format!("{SITE}/pricing"), div_soup_page())
}

/// Insert a job in the given state, created at `created_at`.
pub async fn insert_job(
    store: &dyn JobStore,
    status: JobStatus,
    retry_count: i32,
    created_at: DateTime<Utc>,
) -> Result<AnalysisJob> {
    let job = AnalysisJob::builder()
        .user_id("fixture-user")
        .url(SITE)
        .retry_count(retry_count)
        .created_at(created_at)
        .build();
    store.insert(&job).await?;

    if status != JobStatus::Pending {
        store.claim(job.job_id).await?;
    }
    if status == JobStatus::Failed {
        let failure = JobFailure {
            message: "fixture failure".into(),
            details: json!({"kind": "fixture"}),
        };
        store
            .fail(job.job_id, JobStatus::InProgress, &failure, created_at)
            .await?;
    }

    Ok(store.get(job.job_id).await?.unwrap_or(job))
}
