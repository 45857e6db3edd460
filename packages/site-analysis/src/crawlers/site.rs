//! Breadth-first site crawler.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

use crate::crawlers::robots::{fetch_robots_policy, RobotsPolicy};
use crate::crawlers::url as urls;
use crate::error::CrawlError;
use crate::pipeline::document;
use crate::traits::fetcher::PageFetcher;
use crate::types::config::CrawlConfig;
use crate::types::crawl::CrawlResult;

/// Discovers the internal pages of a site.
///
/// Traversal is breadth-first from the start URL. Each URL is enqueued at
/// most once and checked against robots.txt before it consumes page budget.
/// Links are internal when their second-level domain matches the start URL's.
pub struct SiteCrawler<F> {
    fetcher: F,
    config: CrawlConfig,
}

impl<F: PageFetcher> SiteCrawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl from `start_url`, loading robots.txt first.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlResult, CrawlError> {
        let start = urls::normalize(start_url).ok_or_else(|| CrawlError::InvalidUrl {
            url: start_url.to_string(),
        })?;
        let policy = fetch_robots_policy(&self.fetcher, &start).await;
        self.crawl_with_policy(&start, &policy).await
    }

    /// Crawl from `start_url` under an already loaded robots policy.
    pub async fn crawl_with_policy(
        &self,
        start_url: &str,
        policy: &RobotsPolicy,
    ) -> Result<CrawlResult, CrawlError> {
        let start = urls::normalize(start_url).ok_or_else(|| CrawlError::InvalidUrl {
            url: start_url.to_string(),
        })?;
        let base_domain = urls::base_domain(&start).ok_or_else(|| CrawlError::InvalidUrl {
            url: start_url.to_string(),
        })?;

        let user_agent = self.config.user_agent.as_str();
        let limit = self.config.max_pages;
        let delay = match (policy.crawl_delay(user_agent), self.config.max_crawl_delay) {
            (Some(requested), Some(cap)) => Some(requested.min(cap)),
            _ => None,
        };

        info!(url = %start, limit, base_domain = %base_domain, "Starting site crawl");

        let mut queue = VecDeque::from([start.clone()]);
        let mut seen: HashSet<String> = HashSet::from([start.clone()]);
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut link_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut external_domains: BTreeSet<String> = BTreeSet::new();
        let mut admitted = 0usize;

        while let Some(url) = queue.pop_front() {
            if admitted >= limit {
                break;
            }

            if !policy.can_fetch(user_agent, &url) {
                debug!(url = %url, "Disallowed by robots.txt");
                continue;
            }
            admitted += 1;

            // A budget of one admits the start URL without fetching it
            if limit == 1 {
                visited.insert(url.clone());
                link_map.insert(url, Vec::new());
                continue;
            }

            if admitted > 1 {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
            }

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to fetch page");
                    visited.insert(url.clone());
                    link_map.insert(url, Vec::new());
                    continue;
                }
            };

            if !page.is_html() {
                debug!(
                    url = %url,
                    content_type = page.content_type.as_deref().unwrap_or(""),
                    "Skipping non-HTML response"
                );
                continue;
            }

            let base = Url::parse(&page.final_url)
                .or_else(|_| Url::parse(&url))
                .map_err(|_| CrawlError::InvalidUrl { url: url.clone() })?;

            let mut outbound = Vec::new();
            for href in document::anchor_hrefs(&page.body) {
                let Some(link) = urls::resolve(&base, &href) else {
                    continue;
                };

                if urls::base_domain(&link).as_deref() == Some(base_domain.as_str()) {
                    if seen.insert(link.clone()) {
                        queue.push_back(link.clone());
                    }
                } else if let Some(host) = urls::host(&link) {
                    external_domains.insert(host);
                }
                outbound.push(link);
            }

            debug!(url = %url, links = outbound.len(), queued = queue.len(), "Page crawled");
            visited.insert(url.clone());
            link_map.insert(url, outbound);
        }

        if visited.is_empty() {
            warn!(url = %start, "Crawl visited no pages");
            return Err(CrawlError::NothingVisited { url: start });
        }

        info!(
            url = %start,
            pages = visited.len(),
            external_domains = external_domains.len(),
            "Site crawl complete"
        );

        Ok(CrawlResult {
            urls: visited.into_iter().collect(),
            link_map,
            external_domains: external_domains.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::robots::RobotsTxt;
    use crate::testing::MockFetcher;
    use crate::traits::fetcher::FetchedPage;
    use std::time::Duration;

    fn config(max_pages: usize) -> CrawlConfig {
        CrawlConfig::default()
            .with_max_pages(max_pages)
            .with_max_crawl_delay(None)
    }

    #[tokio::test]
    async fn three_page_site_with_duplicate_links() {
        let fetcher = MockFetcher::new()
            .with_page(
                "https://example.com",
                r#"<a href="/about">About</a><a href="/about/">About again</a>
                   <a href="https://partner.org/x">Partner</a>"#,
            )
            .with_page(
                "https://example.com/about",
                r#"<a href="https://example.com/">Home</a><a href="/about#team">Team</a>"#,
            );

        let crawler = SiteCrawler::new(fetcher.clone(), config(50));
        let result = crawler
            .crawl_with_policy("https://example.com/", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert_eq!(
            result.urls,
            vec!["https://example.com", "https://example.com/about"]
        );
        assert_eq!(result.external_domains, vec!["partner.org"]);
        assert_eq!(
            result.link_map["https://example.com"],
            vec![
                "https://example.com/about",
                "https://example.com/about",
                "https://partner.org/x"
            ]
        );
        assert_eq!(
            result.link_map["https://example.com/about"],
            vec!["https://example.com", "https://example.com/about"]
        );
        assert_eq!(fetcher.fetch_count("https://example.com/about"), 1);
    }

    #[tokio::test]
    async fn subdomains_share_the_base_domain() {
        let fetcher = MockFetcher::new()
            .with_page(
                "https://example.com",
                r#"<a href="https://blog.example.com/post">Post</a>"#,
            )
            .with_page("https://blog.example.com/post", "<p>hi</p>");

        let crawler = SiteCrawler::new(fetcher, config(10));
        let result = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert!(result.urls.contains(&"https://blog.example.com/post".to_string()));
        assert!(result.external_domains.is_empty());
    }

    #[tokio::test]
    async fn disallowed_urls_are_never_fetched() {
        let fetcher = MockFetcher::new()
            .with_page(
                "https://example.com",
                r#"<a href="/private/a">A</a><a href="/public">B</a>"#,
            )
            .with_page("https://example.com/private/a", "<p>secret</p>")
            .with_page("https://example.com/public", "<p>open</p>");
        let policy = RobotsPolicy::Rules(RobotsTxt::parse("User-agent: *\nDisallow: /private"));

        let crawler = SiteCrawler::new(fetcher.clone(), config(10));
        let result = crawler
            .crawl_with_policy("https://example.com", &policy)
            .await
            .unwrap();

        assert_eq!(fetcher.fetch_count("https://example.com/private/a"), 0);
        assert!(!result.link_map.contains_key("https://example.com/private/a"));
        assert!(!result.urls.contains(&"https://example.com/private/a".to_string()));
        assert!(result.urls.contains(&"https://example.com/public".to_string()));
    }

    #[tokio::test]
    async fn crawl_delay_spaces_out_fetches() {
        let fetcher = MockFetcher::new()
            .with_page("https://example.com", r#"<a href="/a">A</a><a href="/b">B</a>"#)
            .with_page("https://example.com/a", "<p>a</p>")
            .with_page("https://example.com/b", "<p>b</p>");
        let policy = RobotsPolicy::Rules(RobotsTxt::parse("User-agent: *\nCrawl-delay: 0.05"));
        let config = config(10).with_max_crawl_delay(Some(Duration::from_secs(1)));

        let started = std::time::Instant::now();
        let result = SiteCrawler::new(fetcher, config)
            .crawl_with_policy("https://example.com", &policy)
            .await
            .unwrap();

        assert_eq!(result.urls.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn oversized_crawl_delay_is_capped() {
        let fetcher = MockFetcher::new()
            .with_page("https://example.com", r#"<a href="/a">A</a><a href="/b">B</a>"#)
            .with_page("https://example.com/a", "<p>a</p>")
            .with_page("https://example.com/b", "<p>b</p>");
        let policy = RobotsPolicy::Rules(RobotsTxt::parse("User-agent: *\nCrawl-delay: 1e30"));

        for cap in [Some(Duration::from_millis(10)), None] {
            let crawler = SiteCrawler::new(fetcher.clone(), config(10).with_max_crawl_delay(cap));
            let result = crawler
                .crawl_with_policy("https://example.com", &policy)
                .await
                .unwrap();
            assert_eq!(result.urls.len(), 3);
        }
    }

    #[tokio::test]
    async fn budget_of_one_does_not_fetch() {
        let fetcher = MockFetcher::new().with_page("https://example.com", "<a href='/x'>x</a>");

        let crawler = SiteCrawler::new(fetcher.clone(), config(1));
        let result = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert_eq!(result.urls, vec!["https://example.com"]);
        assert_eq!(fetcher.total_fetches(), 0);
    }

    #[tokio::test]
    async fn budget_limits_admitted_pages() {
        let links: String = (0..10)
            .map(|i| format!(r#"<a href="/p{i}">p{i}</a>"#))
            .collect();
        let mut fetcher = MockFetcher::new().with_page("https://example.com", links);
        for i in 0..10 {
            fetcher = fetcher.with_page(format!("https://example.com/p{i}"), "<p>x</p>");
        }

        let crawler = SiteCrawler::new(fetcher.clone(), config(4));
        let result = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert_eq!(result.urls.len(), 4);
        assert_eq!(fetcher.total_fetches(), 4);
    }

    #[tokio::test]
    async fn non_html_responses_are_dropped() {
        let fetcher = MockFetcher::new()
            .with_page("https://example.com", r#"<a href="/report.pdf">PDF</a>"#)
            .with_response(
                FetchedPage::html("https://example.com/report.pdf", "%PDF")
                    .with_content_type("application/pdf"),
            );

        let crawler = SiteCrawler::new(fetcher, config(10));
        let result = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert_eq!(result.urls, vec!["https://example.com"]);
    }

    #[tokio::test]
    async fn fully_disallowed_site_fails() {
        let fetcher = MockFetcher::new().with_page("https://example.com", "<p>x</p>");
        let crawler = SiteCrawler::new(fetcher, config(10));

        let err = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::DisallowAll)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::NothingVisited { .. }));
    }

    #[tokio::test]
    async fn fetch_errors_do_not_stop_traversal() {
        let fetcher = MockFetcher::new()
            .with_page(
                "https://example.com",
                r#"<a href="/broken">x</a><a href="/ok">y</a>"#,
            )
            .with_status("https://example.com/broken", 500)
            .with_page("https://example.com/ok", "<p>ok</p>");

        let crawler = SiteCrawler::new(fetcher, config(10));
        let result = crawler
            .crawl_with_policy("https://example.com", &RobotsPolicy::Unrestricted)
            .await
            .unwrap();

        assert!(result.urls.contains(&"https://example.com/ok".to_string()));
        assert_eq!(result.link_map["https://example.com/broken"], Vec::<String>::new());
    }

    #[tokio::test]
    async fn invalid_start_url_is_rejected() {
        let crawler = SiteCrawler::new(MockFetcher::new(), config(10));
        let err = crawler.crawl("not a url").await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
    }
}
