use reqwest::header::HeaderMap;
use seo_sentinel::network::identity::CrawlerIdentity;

#[test]
fn test_default_identity_structure() {
    let identity = CrawlerIdentity::default();
    assert!(identity.user_agent.contains("SEOSentinel/0.1"));
    assert_eq!(identity.robots_token, "SEOSentinel");
}

#[test]
fn test_custom_agent_token() {
    let identity = CrawlerIdentity::with_user_agent("AuditBot/2.3 (+https://example.com/bot)");
    assert_eq!(identity.robots_token, "AuditBot");
}

#[test]
fn test_apply_to_headers_integrity() {
    let identity = CrawlerIdentity::default();
    let mut headers = HeaderMap::new();
    identity.apply_to_headers(&mut headers).unwrap();

    let ua = headers.get("User-Agent").unwrap().to_str().unwrap();
    assert_eq!(ua, identity.user_agent);
    assert_eq!(headers.get("accept-language").unwrap(), "en-US,en;q=0.9");
}

#[test]
fn test_rejects_control_characters() {
    let identity = CrawlerIdentity::with_user_agent("Bad\nAgent");
    let mut headers = HeaderMap::new();
    assert!(identity.apply_to_headers(&mut headers).is_err());
}
