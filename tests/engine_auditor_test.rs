use seo_sentinel::config::BatchConfig;
use seo_sentinel::engine::auditor::{summarize, PageStatus, SiteAuditor};
use seo_sentinel::network::{AsyncResult, FetchError, FetchedPage, PageSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const GOOD_PAGE: &str = r#"<html><head>
<title>Custom Video Greetings for Every Occasion</title>
<meta name="description" content="Create personalized video greetings for birthdays, weddings and anniversaries. Record, customize and share heartfelt messages in minutes.">
<meta property="og:title" content="Video greetings">
<meta property="og:description" content="Personal video messages">
<meta property="og:image" content="https://site.test/og.jpg">
<meta name="twitter:card" content="summary_large_image">
<script type="application/ld+json">{"@type":"Organization","name":"Site"}</script>
</head><body><h1>Video greetings</h1><img src="/a.jpg" alt="Birthday greeting"></body></html>"#;

const BARE_PAGE: &str = "<html><body><p>nothing here</p></body></html>";

// * Serves canned bodies; anything else is a 404. Counts robots.txt requests.
struct CannedSite {
    pages: HashMap<String, String>,
    robots_fetches: AtomicUsize,
}

impl CannedSite {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect(),
            robots_fetches: AtomicUsize::new(0),
        }
    }
}

impl PageSource for CannedSite {
    fn fetch_page(&self, url: &str) -> AsyncResult<FetchedPage> {
        if url.ends_with("/robots.txt") {
            self.robots_fetches.fetch_add(1, Ordering::SeqCst);
        }
        let result = match self.pages.get(url) {
            Some(body) => Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                body: body.clone(),
                elapsed_ms: 7,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        };
        Box::pin(async move { result })
    }
}

fn auditor(pages: &[(&str, &str)]) -> SiteAuditor {
    let batch = BatchConfig {
        size: 2,
        pause_ms: 0,
        requests_per_second: 50,
    };
    SiteAuditor::new(Arc::new(CannedSite::new(pages)), "SEOSentinel", batch)
}

#[tokio::test]
async fn test_audit_url_scores_page() {
    let auditor = auditor(&[("https://site.test/", GOOD_PAGE)]);

    let analysis = auditor.audit_url("https://site.test/").await.unwrap();
    assert_eq!(analysis.score, 100);
    assert!(analysis.issues.is_empty());
    assert_eq!(analysis.load_time_ms, Some(7));
}

#[tokio::test]
async fn test_audit_url_propagates_fetch_error() {
    let auditor = auditor(&[]);

    let err = auditor.audit_url("https://site.test/gone").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_audit_html_skips_fetch() {
    let auditor = auditor(&[]);

    let analysis = auditor.audit_html("https://site.test/draft", BARE_PAGE);
    assert_eq!(analysis.score, 0);
    assert_eq!(analysis.load_time_ms, None);
}

#[tokio::test]
async fn test_batch_counts_each_outcome() {
    let auditor = auditor(&[
        ("https://site.test/robots.txt", "User-agent: *\nDisallow: /private/\n"),
        ("https://site.test/", GOOD_PAGE),
        ("https://site.test/about", BARE_PAGE),
        ("https://site.test/private/admin", GOOD_PAGE),
    ]);
    let urls = vec![
        "https://site.test/".to_string(),
        "https://site.test/about".to_string(),
        "https://site.test/private/admin".to_string(),
        "https://site.test/missing".to_string(),
    ];

    let report = auditor.audit_batch("site.test", Some(urls)).await;

    assert_eq!(report.total_urls, 4);
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.pages[2].status, PageStatus::Skipped);
    assert_eq!(report.pages[3].status, PageStatus::Failed);
    assert_eq!(report.summary.average_score, 50);
    assert_eq!(report.analyses().count(), 2);
}

#[tokio::test]
async fn test_batch_fetches_robots_once_and_honours_crawl_delay() {
    let site = Arc::new(CannedSite::new(&[
        ("https://site.test/robots.txt", "User-agent: *\nCrawl-delay: 0.2\n"),
        ("https://site.test/a", GOOD_PAGE),
        ("https://site.test/b", GOOD_PAGE),
        ("https://site.test/c", GOOD_PAGE),
        ("https://site.test/d", GOOD_PAGE),
    ]));
    let batch = BatchConfig {
        size: 4,
        pause_ms: 0,
        requests_per_second: 50,
    };
    let auditor = SiteAuditor::new(site.clone(), "SEOSentinel", batch);
    let urls = ["a", "b", "c", "d"]
        .iter()
        .map(|p| format!("https://site.test/{}", p))
        .collect();

    let started = Instant::now();
    let report = auditor.audit_batch("site.test", Some(urls)).await;

    assert_eq!(report.processed, 4);
    assert_eq!(site.robots_fetches.load(Ordering::SeqCst), 1);
    // * First request is immediate, the other three wait one period each
    assert!(started.elapsed() >= Duration::from_millis(550), "{:?}", started.elapsed());
}

#[tokio::test]
async fn test_batch_discovers_from_sitemap() {
    let sitemap = r#"<?xml version="1.0"?><urlset>
<url><loc>https://site.test/</loc></url>
<url><loc>https://site.test/pricing</loc></url>
<url><loc>https://site.test/</loc></url>
</urlset>"#;
    let auditor = auditor(&[
        ("https://site.test/sitemap.xml", sitemap),
        ("https://site.test/", GOOD_PAGE),
        ("https://site.test/pricing", GOOD_PAGE),
    ]);

    let report = auditor.audit_batch("site.test", None).await;

    assert_eq!(report.total_urls, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.summary.average_score, 100);
}

#[tokio::test]
async fn test_batch_falls_back_to_common_pages() {
    let auditor = auditor(&[("https://site.test/", BARE_PAGE)]);

    let report = auditor.audit_batch("site.test", Some(Vec::new())).await;

    assert_eq!(report.total_urls, 5);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 4);
    assert_eq!(report.pages[0].url, "https://site.test/");
}

#[test]
fn test_summarize_orders_common_issues() {
    let bare = seo_sentinel::analyze(BARE_PAGE, "https://site.test/a");
    let good = seo_sentinel::analyze(GOOD_PAGE, "https://site.test/b");

    let summary = summarize(&[&bare, &good]);
    assert_eq!(summary.average_score, 50);
    assert_eq!(summary.total_issues, bare.issues.len());
    assert!(!summary.common_issues.is_empty());
    assert!(summary
        .common_issues
        .windows(2)
        .all(|w| w[0].count >= w[1].count));

    assert_eq!(summarize(&[]).average_score, 0);
}
