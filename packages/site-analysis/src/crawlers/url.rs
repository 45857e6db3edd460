//! URL normalization and domain scoping.

use url::Url;

/// Parse an absolute URL and normalize it.
pub fn normalize(raw: &str) -> Option<String> {
    Url::parse(raw.trim()).ok().and_then(normalize_parsed)
}

/// Resolve `href` against the page it appeared on and normalize the result.
///
/// Returns `None` for unparseable targets and for schemes other than
/// http/https (`mailto:`, `javascript:`, `tel:` ...).
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().and_then(normalize_parsed)
}

/// Canonical form: scheme + host + path, without query or fragment and
/// without a single trailing slash.
fn normalize_parsed(mut url: Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);

    let mut s: String = url.into();
    if s.ends_with('/') {
        s.pop();
    }
    Some(s)
}

/// Last two dot-separated labels of a host (`blog.example.com` -> `example.com`).
pub fn base_domain_of_host(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        host.to_string()
    }
}

/// Second-level domain of a URL, if it has a host.
pub fn base_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(base_domain_of_host))
}

/// Host of a URL, if any.
pub fn host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// First label of the host (`docs.example.com` -> `docs`).
pub fn subdomain_label(url: &str) -> Option<String> {
    host(url).and_then(|h| h.split('.').next().map(str::to_string))
}

/// Collection key of bare-domain URLs.
pub const ROOT_COLLECTION: &str = "root";

/// First non-empty path segment, or [`ROOT_COLLECTION`] for a bare-domain URL.
pub fn collection_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| ROOT_COLLECTION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("https://example.com/about/?ref=nav#team").as_deref(),
            Some("https://example.com/about")
        );
        assert_eq!(
            normalize("https://example.com/").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize("https://example.com").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn resolve_rejects_non_http_schemes() {
        let base = Url::parse("https://example.com/blog").unwrap();
        assert_eq!(resolve(&base, "mailto:hi@example.com"), None);
        assert_eq!(resolve(&base, "javascript:void(0)"), None);
        assert_eq!(
            resolve(&base, "/contact?x=1").as_deref(),
            Some("https://example.com/contact")
        );
        assert_eq!(
            resolve(&base, "#top").as_deref(),
            Some("https://example.com/blog")
        );
    }

    #[test]
    fn base_domain_uses_last_two_labels() {
        assert_eq!(
            base_domain("https://shop.blog.example.com/x").as_deref(),
            Some("example.com")
        );
        assert_eq!(base_domain("http://localhost:8080").as_deref(), Some("localhost"));
    }

    #[test]
    fn collection_key_is_first_segment() {
        assert_eq!(collection_key("https://example.com/blog/post-1"), "blog");
        assert_eq!(collection_key("https://example.com"), "root");
        assert_eq!(collection_key("https://example.com/about"), "about");
    }
}
