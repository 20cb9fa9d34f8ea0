use seo_sentinel::engine::discovery::parse_sitemap_locs;
use seo_sentinel::engine::politeness::RobotsRules;
use seo_sentinel::generators::robots::{self, RobotsProfile};
use seo_sentinel::generators::sitemap::{self, SitemapOptions};

// * Generated files must be readable by the crate's own crawler side.

#[test]
fn test_generated_robots_honoured_by_auditor_rules() {
    let content = robots::generate(RobotsProfile::VideoGreeting, "wishesvideo.com");
    let rules = RobotsRules::new("SEOSentinel", &content);

    assert!(rules.is_allowed("https://wishesvideo.com/videos/birthday"));
    assert!(!rules.is_allowed("https://wishesvideo.com/admin/users"));
    assert!(!robots::is_allowed(&content, "AhrefsBot", "/videos/birthday"));
}

#[test]
fn test_basic_robots_crawl_delay_only_for_named_bots() {
    let content = robots::generate(RobotsProfile::Basic, "wishesvideo.com");

    assert_eq!(RobotsRules::new("SEOSentinel", &content).crawl_delay_ms(), None);
    assert_eq!(RobotsRules::new("Bingbot", &content).crawl_delay_ms(), Some(2000));
}

#[test]
fn test_generated_sitemap_round_trips_through_discovery() {
    let entries = sitemap::video_greeting_entries("https://wishesvideo.com");
    let xml = sitemap::generate(&entries, SitemapOptions::default());

    let validation = sitemap::validate(&xml);
    assert!(validation.is_valid, "{:?}", validation.errors);
    assert_eq!(validation.url_count, entries.len());

    let locs = parse_sitemap_locs(&xml);
    let expected: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
    assert_eq!(locs, expected);
}

#[test]
fn test_split_parts_each_validate() {
    let entries = sitemap::video_greeting_entries("https://wishesvideo.com");
    let files = sitemap::split_with_limit(&entries, SitemapOptions::default(), 10);

    assert_eq!(files.len(), 2);
    assert_eq!(files.iter().map(|f| f.url_count).sum::<usize>(), entries.len());
    for file in &files {
        assert!(sitemap::validate(&file.content).is_valid, "{}", file.filename);
    }
}
