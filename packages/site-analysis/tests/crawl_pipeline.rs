//! Crawl, sample, score and extract a small site end to end.

use rand::rngs::StdRng;
use rand::SeedableRng;
use site_analysis::testing::{MockFetcher, MockSemanticExtractor};
use site_analysis::{
    choose_method, confidence_score, extract_structure, sample_collections, CrawlConfig,
    ExtractionMethod, PageFetcher, SamplingConfig, ScorerConfig, SemanticExtractor, SiteCrawler,
};

fn init_tracing() {
    // RUST_LOG=site_analysis=debug shows crawl decisions
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn rich_page(title: &str) -> String {
    let body: String = (0..12)
        .map(|i| {
            format!(
                "<h2>{title} part {i}</h2><p>A long explanatory paragraph about {title} that \
                 keeps going with enough words to look like real copy. It describes the offer, \
                 the audience and the next step for a visitor, item {i}.</p>"
            )
        })
        .collect();
    format!("<html><head><title>{title}</title></head><body><main><h1>{title}</h1>{body}</main></body></html>")
}

/// Home links to /services twice (once with a trailing slash) and to
/// /contact, which robots.txt blocks.
fn site() -> MockFetcher {
    MockFetcher::new()
        .with_robots("https://acme.example", "User-agent: *\nDisallow: /contact\n")
        .with_page(
            "https://acme.example",
            format!(
                r#"{}<a href="/services">S</a><a href="/services/">S again</a><a href="/contact">C</a>"#,
                rich_page("Home")
            ),
        )
        .with_page(
            "https://acme.example/services",
            format!(r#"<div><div>{}</div></div><a href="/">Home</a>"#, "<span>x</span>".repeat(30)),
        )
}

#[tokio::test]
async fn three_link_site_resolves_to_two_pages() {
    init_tracing();
    let fetcher = site();
    let config = CrawlConfig::default().with_max_crawl_delay(None);
    let crawler = SiteCrawler::new(fetcher.clone(), config);

    let crawl = crawler.crawl("https://acme.example/").await.unwrap();

    assert_eq!(
        crawl.urls,
        vec!["https://acme.example", "https://acme.example/services"]
    );
    for links in crawl.link_map.values() {
        for link in links {
            assert!(link.starts_with("https://"), "unresolved link {link}");
        }
    }
    assert_eq!(fetcher.fetch_count("https://acme.example/contact"), 0);

    let mut rng = StdRng::seed_from_u64(42);
    let sampled = sample_collections(&crawl.urls, &SamplingConfig::default(), &mut rng);
    assert_eq!(sampled.selected, crawl.urls);

    let scorer = ScorerConfig::default();
    let semantic = MockSemanticExtractor::new();
    let mut records = Vec::new();
    for url in &sampled.selected {
        let page = fetcher.fetch(url).await.unwrap();
        let score = confidence_score(&page.body, &scorer);
        let record = match choose_method(score, &scorer) {
            ExtractionMethod::Structural => extract_structure(&page.body, url).unwrap(),
            ExtractionMethod::Semantic => semantic.extract(&page.body, url).await.unwrap(),
        };
        records.push(record);
    }

    assert_eq!(records[0].parsing_method, ExtractionMethod::Structural);
    assert_eq!(records[0].h1, "Home");
    assert_eq!(records[0].content_structure.len(), 12);
    assert_eq!(records[1].parsing_method, ExtractionMethod::Semantic);
    assert_eq!(semantic.calls(), vec!["https://acme.example/services"]);
}
