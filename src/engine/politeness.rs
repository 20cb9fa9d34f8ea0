// * Crawl politeness for batch audits
// * Per-host robots.txt rules plus a governor limiter honouring Crawl-delay.

use governor::{Quota, RateLimiter as GovernorLimiter};
use nonzero_ext::nonzero;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;
use url::Url;

use crate::engine::normalization::host_of;
use crate::network::PageSource;

type DirectLimiter = GovernorLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

// * RobotsRules wraps a robots.txt body for one user-agent token
#[derive(Debug, Clone)]
pub struct RobotsRules {
    user_agent: String,
    body: String,
}

impl RobotsRules {
    pub fn new(user_agent: &str, body: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            body: body.to_string(),
        }
    }

    // * No robots.txt (or an unreachable one) means everything is allowed
    pub fn allow_all(user_agent: &str) -> Self {
        Self::new(user_agent, "")
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.body, &self.user_agent, url)
    }

    // * Crawl-delay in ms for our agent or "*"; the crate ignores this directive
    pub fn crawl_delay_ms(&self) -> Option<u64> {
        let mut in_matching_group = false;
        let mut found = None;
        let agent = self.user_agent.to_lowercase();

        for line in self.body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    let candidate = value.to_lowercase();
                    in_matching_group = candidate == "*" || agent.contains(&candidate);
                }
                "crawl-delay" if in_matching_group => {
                    if let Ok(secs) = value.parse::<f64>() {
                        if secs >= 0.0 {
                            found = Some((secs * 1000.0) as u64);
                        }
                    }
                }
                _ => {}
            }
        }
        found
    }
}

// * HostPolicy pairs the robots rules of a host with its limiter
pub struct HostPolicy {
    host: String,
    rules: RobotsRules,
    limiter: DirectLimiter,
}

impl HostPolicy {
    pub fn new(host: &str, rules: RobotsRules, requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let quota = rules
            .crawl_delay_ms()
            .filter(|ms| *ms > 0)
            .and_then(|ms| Quota::with_period(Duration::from_millis(ms)))
            .unwrap_or_else(|| Quota::per_second(rps));

        Self {
            host: host.to_string(),
            rules,
            limiter: GovernorLimiter::direct(quota),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn rules(&self) -> &RobotsRules {
        &self.rules
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.rules.is_allowed(url)
    }

    // * Waits until the limiter admits one request
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

// * PolitenessManager caches one HostPolicy per host for the lifetime of an auditor.
// * Each host gets one OnceCell, so concurrent first requests share a single robots.txt fetch.
pub struct PolitenessManager {
    user_agent: String,
    requests_per_second: u32,
    policies: RwLock<HashMap<String, Arc<OnceCell<Arc<HostPolicy>>>>>,
}

impl PolitenessManager {
    pub fn new(user_agent: &str, requests_per_second: u32) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            requests_per_second,
            policies: RwLock::new(HashMap::new()),
        }
    }

    async fn cell_for(&self, host: &str) -> Arc<OnceCell<Arc<HostPolicy>>> {
        if let Some(cell) = self.policies.read().await.get(host) {
            return Arc::clone(cell);
        }
        let mut policies = self.policies.write().await;
        Arc::clone(policies.entry(host.to_string()).or_default())
    }

    // * Returns the cached policy or fetches /robots.txt through `source`
    pub async fn policy_for(&self, source: &dyn PageSource, url: &str) -> Option<Arc<HostPolicy>> {
        let host = host_of(url)?;
        let robots_url = Url::parse(url).ok()?.join("/robots.txt").ok()?;
        let cell = self.cell_for(&host).await;

        let policy = cell
            .get_or_init(|| async {
                let rules = match source.fetch_page(robots_url.as_str()).await {
                    Ok(page) => RobotsRules::new(&self.user_agent, &page.body),
                    Err(e) => {
                        debug!(host = %host, error = %e, "No robots.txt, allowing all");
                        RobotsRules::allow_all(&self.user_agent)
                    }
                };
                self.build_policy(&host, rules)
            })
            .await;
        Some(Arc::clone(policy))
    }

    pub async fn register(&self, host: &str, rules: RobotsRules) -> Arc<HostPolicy> {
        let policy = self.build_policy(host, rules);
        self.policies.write().await.insert(
            host.to_string(),
            Arc::new(OnceCell::new_with(Some(Arc::clone(&policy)))),
        );
        policy
    }

    fn build_policy(&self, host: &str, rules: RobotsRules) -> Arc<HostPolicy> {
        let policy = Arc::new(HostPolicy::new(host, rules, self.requests_per_second));
        debug!(
            host = %host,
            crawl_delay_ms = ?policy.rules().crawl_delay_ms(),
            "Registered host policy"
        );
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = r#"
User-agent: *
Crawl-delay: 2
Disallow: /private/
Allow: /public/
"#;

    #[test]
    fn test_crawl_delay_extracted() {
        let rules = RobotsRules::new("SEOSentinel", ROBOTS);
        assert_eq!(rules.crawl_delay_ms(), Some(2000));
    }

    #[test]
    fn test_crawl_delay_for_other_agent_ignored() {
        let rules = RobotsRules::new("SEOSentinel", "User-agent: Googlebot\nCrawl-delay: 9\n");
        assert_eq!(rules.crawl_delay_ms(), None);
    }

    #[test]
    fn test_is_allowed() {
        let rules = RobotsRules::new("SEOSentinel", ROBOTS);
        assert!(rules.is_allowed("https://example.com/public/page.html"));
        assert!(!rules.is_allowed("https://example.com/private/secret.html"));
    }

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all("SEOSentinel");
        assert!(rules.is_allowed("https://example.com/anything"));
        assert_eq!(rules.crawl_delay_ms(), None);
    }

    #[tokio::test]
    async fn test_register_and_limit() {
        let manager = PolitenessManager::new("SEOSentinel", 5);
        let policy = manager
            .register("example.com", RobotsRules::new("SEOSentinel", ROBOTS))
            .await;

        // * One request per two seconds: first admitted, second refused
        assert!(policy.check());
        assert!(!policy.check());
    }

    // * Serves robots.txt and counts how often it was requested
    struct CountingRobots {
        fetches: std::sync::atomic::AtomicUsize,
    }

    impl PageSource for CountingRobots {
        fn fetch_page(&self, url: &str) -> crate::network::AsyncResult<crate::network::FetchedPage> {
            self.fetches.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let page = crate::network::FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                body: ROBOTS.to_string(),
                elapsed_ms: 1,
            };
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(page)
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_policy() {
        let manager = PolitenessManager::new("SEOSentinel", 5);
        let source = CountingRobots {
            fetches: std::sync::atomic::AtomicUsize::new(0),
        };

        let urls: Vec<String> = (0..5).map(|i| format!("https://example.com/p{}", i)).collect();
        let lookups = urls.iter().map(|u| manager.policy_for(&source, u));
        let policies: Vec<_> = futures::future::join_all(lookups)
            .await
            .into_iter()
            .map(Option::unwrap)
            .collect();

        assert_eq!(source.fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(policies.iter().all(|p| Arc::ptr_eq(p, &policies[0])));
        assert_eq!(policies[0].rules().crawl_delay_ms(), Some(2000));
    }
}
