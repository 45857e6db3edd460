use anyhow::{Context, Result};
use dotenvy::dotenv;
use site_analysis::{CrawlConfig, RatioPenalty, SamplingConfig, ScorerConfig, DEFAULT_USER_AGENT};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Subdomains whose pages are never analysed.
pub const DEFAULT_EXCLUDED_SUBDOMAINS: [&str; 6] =
    ["docs", "api", "status", "files", "developer", "support"];

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: LlmConfig,
    pub analysis: AnalysisSettings,
}

/// Connection settings for the OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Tunables of the analysis pipeline and its maintenance loop.
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub crawl: CrawlConfig,
    pub scorer: ScorerConfig,
    pub sampling: SamplingConfig,
    pub excluded_subdomains: Vec<String>,

    /// Age after which a non-terminal job is considered stuck
    pub staleness_window: chrono::Duration,
    /// How long failed jobs are kept
    pub retention_window: chrono::Duration,
    pub reaper_interval: Duration,
    pub worker_count: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            scorer: ScorerConfig::default(),
            sampling: SamplingConfig::default(),
            excluded_subdomains: DEFAULT_EXCLUDED_SUBDOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            staleness_window: chrono::Duration::minutes(5),
            retention_window: chrono::Duration::hours(24),
            reaper_interval: Duration::from_secs(300),
            worker_count: 2,
        }
    }
}

impl AnalysisSettings {
    /// Whether `url` lives on a subdomain excluded from analysis.
    pub fn is_excluded_subdomain(&self, url: &str) -> bool {
        site_analysis::crawlers::url::subdomain_label(url)
            .map(|label| {
                let label = label.to_lowercase();
                self.excluded_subdomains.iter().any(|s| *s == label)
            })
            .unwrap_or(false)
    }

    /// Load settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let scorer_defaults = defaults.scorer.clone();

        let crawl = CrawlConfig::default()
            .with_max_pages(parse_var("MAX_PAGES_TO_CRAWL", defaults.crawl.max_pages)?)
            .with_timeout(Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 10)?))
            .with_user_agent(
                env::var("CRAWLER_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            )
            .with_max_crawl_delay(Some(Duration::from_secs(parse_var(
                "MAX_CRAWL_DELAY_SECS",
                5,
            )?)));

        let scorer = ScorerConfig::default()
            .with_threshold(parse_var("CONFIDENCE_THRESHOLD", scorer_defaults.threshold)?)
            .with_semantic_ratio(RatioPenalty {
                bad: parse_var(
                    "SCORER_SEMANTIC_RATIO_THRESHOLD_BAD",
                    scorer_defaults.semantic_ratio.bad,
                )?,
                bad_penalty: parse_var(
                    "SCORER_SEMANTIC_RATIO_PENALTY_BAD",
                    scorer_defaults.semantic_ratio.bad_penalty,
                )?,
                ok: parse_var(
                    "SCORER_SEMANTIC_RATIO_THRESHOLD_OK",
                    scorer_defaults.semantic_ratio.ok,
                )?,
                ok_penalty: parse_var(
                    "SCORER_SEMANTIC_RATIO_PENALTY_OK",
                    scorer_defaults.semantic_ratio.ok_penalty,
                )?,
            })
            .with_text_to_tag_ratio(RatioPenalty {
                bad: parse_var(
                    "SCORER_TEXT_TO_TAG_RATIO_THRESHOLD_BAD",
                    scorer_defaults.text_to_tag_ratio.bad,
                )?,
                bad_penalty: parse_var(
                    "SCORER_TEXT_TO_TAG_RATIO_PENALTY_BAD",
                    scorer_defaults.text_to_tag_ratio.bad_penalty,
                )?,
                ok: parse_var(
                    "SCORER_TEXT_TO_TAG_RATIO_THRESHOLD_OK",
                    scorer_defaults.text_to_tag_ratio.ok,
                )?,
                ok_penalty: parse_var(
                    "SCORER_TEXT_TO_TAG_RATIO_PENALTY_OK",
                    scorer_defaults.text_to_tag_ratio.ok_penalty,
                )?,
            })
            .with_min_body_size(
                parse_var(
                    "SCORER_BODY_SIZE_THRESHOLD_SMALL",
                    scorer_defaults.min_body_size,
                )?,
                parse_var(
                    "SCORER_BODY_SIZE_PENALTY_SMALL",
                    scorer_defaults.small_body_penalty,
                )?,
            );

        let sampling = SamplingConfig::default()
            .with_group_threshold(parse_var(
                "COLLECTION_THRESHOLD",
                defaults.sampling.group_threshold,
            )?)
            .with_sample_size(parse_var(
                "COLLECTION_SAMPLE_SIZE",
                defaults.sampling.sample_size,
            )?);

        let excluded_subdomains = match env::var("EXCLUDED_SUBDOMAINS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.excluded_subdomains,
        };

        let worker_count: usize = parse_var("WORKER_COUNT", defaults.worker_count)?;
        anyhow::ensure!(worker_count > 0, "WORKER_COUNT must be at least 1");

        Ok(Self {
            crawl,
            scorer,
            sampling,
            excluded_subdomains,
            staleness_window: chrono::Duration::minutes(parse_var("STALE_JOB_MINUTES", 5)?),
            retention_window: chrono::Duration::hours(parse_var(
                "FAILED_JOB_RETENTION_HOURS",
                24,
            )?),
            reaper_interval: Duration::from_secs(parse_var("REAPER_INTERVAL_SECS", 300)?),
            worker_count,
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            llm: LlmConfig {
                api_key: env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?,
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 120)?),
            },
            analysis: AnalysisSettings::from_env()?,
        })
    }
}

/// Parse an optional environment variable, using `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_subdomains_match_first_label() {
        let settings = AnalysisSettings::default();
        assert!(settings.is_excluded_subdomain("https://docs.example.com/guide"));
        assert!(settings.is_excluded_subdomain("https://API.example.com"));
        assert!(!settings.is_excluded_subdomain("https://example.com/docs"));
        assert!(!settings.is_excluded_subdomain("https://www.example.com"));
    }

    #[test]
    fn default_windows() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.staleness_window, chrono::Duration::minutes(5));
        assert_eq!(settings.retention_window, chrono::Duration::hours(24));
        assert_eq!(settings.reaper_interval, Duration::from_secs(300));
    }
}
