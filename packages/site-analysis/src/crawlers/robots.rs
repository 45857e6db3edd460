//! Robots.txt parser and crawl policy.

use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;
use crate::traits::fetcher::PageFetcher;

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    groups: Vec<Group>,

    /// Sitemaps listed
    sitemaps: Vec<String>,
}

/// One record: the user agents it names and the rules that follow them.
#[derive(Debug, Clone, Default)]
struct Group {
    /// Lowercased agent names (`*` for the default group)
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl RobotsTxt {
    /// Parse robots.txt content.
    ///
    /// Consecutive `User-agent` lines share the rules that follow them.
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current = Group::default();
        let mut in_rules = false;

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before.trim(),
                None => line.trim(),
            };
            if line.is_empty() {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if in_rules {
                        robots.push_group(std::mem::take(&mut current));
                        in_rules = false;
                    }
                    current.agents.push(value.to_lowercase());
                }
                "disallow" | "allow" => {
                    in_rules = true;
                    // An empty Disallow matches nothing
                    if !value.is_empty() {
                        current.rules.push(Rule {
                            allow: directive == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                "crawl-delay" => {
                    in_rules = true;
                    if let Ok(delay) = value.parse::<f64>() {
                        if delay.is_finite() && delay >= 0.0 {
                            current.crawl_delay = Some(delay);
                        }
                    }
                }
                "sitemap" => {
                    robots.sitemaps.push(value.to_string());
                }
                _ => {}
            }
        }

        robots.push_group(current);
        robots
    }

    fn push_group(&mut self, group: Group) {
        if !group.agents.is_empty() {
            self.groups.push(group);
        }
    }

    /// Groups that apply to a user agent: every group naming its product
    /// token, else every `*` group.
    fn groups_for(&self, user_agent: &str) -> Vec<&Group> {
        let token = product_token(user_agent);

        let specific: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| {
                g.agents
                    .iter()
                    .any(|a| a != "*" && !a.is_empty() && token.contains(a.as_str()))
            })
            .collect();
        if !specific.is_empty() {
            return specific;
        }

        self.groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a == "*"))
            .collect()
    }

    /// Check if a path is allowed for a user-agent.
    ///
    /// The longest matching pattern wins; on equal length `Allow` wins.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };

        let mut best: Option<(usize, bool)> = None;
        for rule in self.groups_for(user_agent).into_iter().flat_map(|g| &g.rules) {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && best_allow) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }

        best.map_or(true, |(_, allow)| allow)
    }

    /// Get crawl delay for a user-agent.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.groups_for(user_agent)
            .into_iter()
            .find_map(|g| g.crawl_delay)
            .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    /// Get listed sitemaps.
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Check if robots.txt disallows all crawling.
    pub fn disallows_all(&self, user_agent: &str) -> bool {
        !self.is_allowed(user_agent, "/")
    }
}

/// Name part of a user agent string, lowercased (`Mozilla/5.0 (...)` -> `mozilla`).
fn product_token(user_agent: &str) -> String {
    user_agent
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Prefix match with `*` wildcards and a `$` end anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    let rest: Vec<&str> = parts.collect();

    for (i, part) in rest.iter().enumerate() {
        let is_last = i + 1 == rest.len();
        if is_last && anchored {
            return path.len() >= pos + part.len() && path[pos..].ends_with(part);
        }
        match path[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }

    !anchored || pos == path.len()
}

/// Crawl policy for one site.
#[derive(Debug, Clone, Default)]
pub enum RobotsPolicy {
    /// No usable robots.txt; everything may be fetched
    #[default]
    Unrestricted,
    /// robots.txt access was refused (401/403); nothing may be fetched
    DisallowAll,
    /// Parsed rules
    Rules(RobotsTxt),
}

impl RobotsPolicy {
    /// Whether `url` may be fetched by `user_agent`.
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::DisallowAll => false,
            Self::Rules(robots) => {
                let path = match Url::parse(url) {
                    Ok(u) => match u.query() {
                        Some(q) => format!("{}?{}", u.path(), q),
                        None => u.path().to_string(),
                    },
                    Err(_) => return false,
                };
                robots.is_allowed(user_agent, &path)
            }
        }
    }

    /// Crawl delay requested for `user_agent`, if any.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        match self {
            Self::Rules(robots) => robots.crawl_delay(user_agent),
            _ => None,
        }
    }
}

/// `scheme://host[:port]/robots.txt` for a site URL.
pub fn robots_url(site_url: &str) -> Option<String> {
    let url = Url::parse(site_url).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    })
}

/// Fetch and interpret robots.txt for a site.
///
/// Never fails: an unreachable robots.txt yields an unrestricted policy and
/// a warning.
pub async fn fetch_robots_policy<F>(fetcher: &F, site_url: &str) -> RobotsPolicy
where
    F: PageFetcher + ?Sized,
{
    let Some(url) = robots_url(site_url) else {
        warn!(url = %site_url, "Cannot derive robots.txt location, crawling unrestricted");
        return RobotsPolicy::Unrestricted;
    };

    match fetcher.fetch(&url).await {
        Ok(page) => {
            debug!(url = %url, bytes = page.body.len(), "robots.txt loaded");
            RobotsPolicy::Rules(RobotsTxt::parse(&page.body))
        }
        Err(FetchError::Status { status, .. }) if status == 401 || status == 403 => {
            info!(url = %url, status, "robots.txt access refused, site disallowed");
            RobotsPolicy::DisallowAll
        }
        Err(FetchError::Status { status, .. }) => {
            debug!(url = %url, status, "No robots.txt, crawling unrestricted");
            RobotsPolicy::Unrestricted
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Could not read robots.txt, crawling unrestricted");
            RobotsPolicy::Unrestricted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let content = r#"
User-agent: *
Disallow: /private/
Disallow: /admin/
Allow: /public/
Crawl-delay: 2

Sitemap: https://example.com/sitemap.xml
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(robots.is_allowed("TestBot", "/public/page"));
        assert!(!robots.is_allowed("TestBot", "/private/page"));
        assert!(!robots.is_allowed("TestBot", "/admin/"));
        assert!(robots.is_allowed("TestBot", "/other/page"));

        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(2)));
        assert_eq!(robots.sitemaps(), ["https://example.com/sitemap.xml"]);
    }

    #[test]
    fn test_specific_user_agent() {
        let content = r#"
User-agent: *
Disallow: /

User-agent: goodbot
Disallow:
Allow: /
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("BadBot/1.0", "/page"));
        assert!(robots.is_allowed("GoodBot/2.1 (+https://example.com)", "/page"));
    }

    #[test]
    fn consecutive_agents_share_rules() {
        let content = r#"
User-agent: alphabot
User-agent: mozilla
Disallow: /drafts/
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("AlphaBot", "/drafts/one"));
        assert!(!robots.is_allowed("Mozilla/5.0 (X11)", "/drafts/one"));
        assert!(robots.is_allowed("OtherBot", "/drafts/one"));
    }

    #[test]
    fn longest_match_wins() {
        let content = r#"
User-agent: *
Disallow: /private/
Allow: /private/public/
Allow: /shop
Disallow: /shop/cart
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("Bot", "/private/secret"));
        assert!(robots.is_allowed("Bot", "/private/public/page"));
        assert!(robots.is_allowed("Bot", "/shop/items"));
        assert!(!robots.is_allowed("Bot", "/shop/cart/checkout"));
    }

    #[test]
    fn wildcards_and_anchors() {
        let content = r#"
User-agent: *
Disallow: /*.pdf$
Disallow: /tmp*/cache
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("Bot", "/files/report.pdf"));
        assert!(robots.is_allowed("Bot", "/files/report.pdf.html"));
        assert!(!robots.is_allowed("Bot", "/tmp-1/cache/x"));
        assert!(robots.is_allowed("Bot", "/tmp-1/other"));
    }

    #[test]
    fn test_empty_robots() {
        let robots = RobotsTxt::parse("");

        assert!(robots.is_allowed("AnyBot", "/any/path"));
        assert!(robots.crawl_delay("AnyBot").is_none());
    }

    #[test]
    fn oversized_crawl_delay_saturates() {
        let robots = RobotsTxt::parse("User-agent: *\nCrawl-delay: 1e30");
        assert_eq!(robots.crawl_delay("Bot"), Some(Duration::MAX));

        let robots = RobotsTxt::parse("User-agent: *\nCrawl-delay: -3\nCrawl-delay: NaN");
        assert_eq!(robots.crawl_delay("Bot"), None);
    }

    #[test]
    fn test_disallow_all() {
        let content = r#"
User-agent: *
Disallow: /
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(robots.disallows_all("Bot"));
        assert!(!robots.is_allowed("Bot", "/anything"));
    }

    #[test]
    fn policy_checks_full_urls() {
        let policy = RobotsPolicy::Rules(RobotsTxt::parse("User-agent: *\nDisallow: /secret"));

        assert!(policy.can_fetch("Bot", "https://example.com"));
        assert!(policy.can_fetch("Bot", "https://example.com/public"));
        assert!(!policy.can_fetch("Bot", "https://example.com/secret/plans"));
        assert!(!RobotsPolicy::DisallowAll.can_fetch("Bot", "https://example.com"));
        assert!(RobotsPolicy::Unrestricted.can_fetch("Bot", "https://example.com/secret"));
    }

    #[test]
    fn robots_location_keeps_port() {
        assert_eq!(
            robots_url("http://127.0.0.1:8080/blog/post").as_deref(),
            Some("http://127.0.0.1:8080/robots.txt")
        );
        assert_eq!(
            robots_url("https://example.com").as_deref(),
            Some("https://example.com/robots.txt")
        );
    }
}
