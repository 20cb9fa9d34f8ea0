// * robots.txt generation, validation and analysis
// * Matching decisions are delegated to the robotstxt crate (Google's parser port).

use regex::Regex;
use robotstxt::DefaultMatcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::LazyLock;

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z-]*)\s*:\s*(.*)$").unwrap());

/// Ready-made rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsProfile {
    #[default]
    Basic,
    VideoGreeting,
}

impl FromStr for RobotsProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "general" => Ok(RobotsProfile::Basic),
            "video-greeting" | "video_greeting" => Ok(RobotsProfile::VideoGreeting),
            other => Err(format!("unknown robots profile: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserAgentRule {
    pub user_agent: String,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay: Option<u32>,
}

impl UserAgentRule {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    pub fn allow(mut self, path: &str) -> Self {
        self.allow.push(path.to_string());
        self
    }

    pub fn disallow(mut self, path: &str) -> Self {
        self.disallow.push(path.to_string());
        self
    }

    pub fn crawl_delay(mut self, seconds: u32) -> Self {
        self.crawl_delay = Some(seconds);
        self
    }
}

/// Custom robots.txt assembly
#[derive(Debug, Clone, Default)]
pub struct RobotsBuilder {
    rules: Vec<UserAgentRule>,
    sitemaps: Vec<String>,
    crawl_delay: Option<u32>,
    host: Option<String>,
}

impl RobotsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: UserAgentRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Duplicates are ignored
    pub fn sitemap(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !self.sitemaps.contains(&url) {
            self.sitemaps.push(url);
        }
        self
    }

    pub fn crawl_delay(mut self, seconds: u32) -> Self {
        self.crawl_delay = Some(seconds);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn build(&self) -> String {
        let mut content = String::new();

        for rule in &self.rules {
            let _ = writeln!(content, "User-agent: {}", rule.user_agent);
            for path in &rule.allow {
                let _ = writeln!(content, "Allow: {}", path);
            }
            for path in &rule.disallow {
                let _ = writeln!(content, "Disallow: {}", path);
            }
            if let Some(delay) = rule.crawl_delay.filter(|d| *d > 0) {
                let _ = writeln!(content, "Crawl-delay: {}", delay);
            }
            content.push('\n');
        }

        if let Some(delay) = self.crawl_delay.filter(|d| *d > 0) {
            let _ = writeln!(content, "Crawl-delay: {}\n", delay);
        }
        if let Some(host) = &self.host {
            let _ = writeln!(content, "Host: {}\n", host);
        }
        for sitemap in &self.sitemaps {
            let _ = writeln!(content, "Sitemap: {}", sitemap);
        }

        content
    }
}

pub fn basic(domain: &str) -> String {
    RobotsBuilder::new()
        .rule(
            UserAgentRule::new("*")
                .allow("/")
                .disallow("/admin/")
                .disallow("/private/")
                .disallow("/temp/")
                .disallow("/*.json$")
                .disallow("/*.xml$"),
        )
        .rule(UserAgentRule::new("Googlebot").allow("/").crawl_delay(1))
        .rule(UserAgentRule::new("Bingbot").allow("/").crawl_delay(2))
        .sitemap(format!("https://{}/sitemap.xml", domain))
        .sitemap(format!("https://{}/sitemap-index.xml", domain))
        .build()
}

/// Video greeting site: media crawlers welcome, SEO tool crawlers blocked
pub fn video_greeting(domain: &str) -> String {
    RobotsBuilder::new()
        .rule(
            UserAgentRule::new("*")
                .allow("/")
                .allow("/videos/")
                .allow("/api/public/")
                .disallow("/admin/")
                .disallow("/api/private/")
                .disallow("/user-data/")
                .disallow("/temp/")
                .disallow("/uploads/private/"),
        )
        .rule(
            UserAgentRule::new("Googlebot")
                .allow("/")
                .allow("/videos/")
                .allow("/api/public/")
                .crawl_delay(1),
        )
        .rule(
            UserAgentRule::new("Googlebot-Video")
                .allow("/videos/")
                .allow("/thumbnails/")
                .disallow("/videos/private/"),
        )
        .rule(
            UserAgentRule::new("Googlebot-Image")
                .allow("/images/")
                .allow("/thumbnails/")
                .allow("/assets/images/"),
        )
        .rule(UserAgentRule::new("facebookexternalhit").allow("/").allow("/videos/"))
        .rule(UserAgentRule::new("Twitterbot").allow("/").allow("/videos/"))
        .rule(UserAgentRule::new("AhrefsBot").disallow("/"))
        .rule(UserAgentRule::new("MJ12bot").disallow("/"))
        .sitemap(format!("https://{}/sitemap.xml", domain))
        .sitemap(format!("https://{}/video-sitemap.xml", domain))
        .sitemap(format!("https://{}/image-sitemap.xml", domain))
        .build()
}

pub fn generate(profile: RobotsProfile, domain: &str) -> String {
    match profile {
        RobotsProfile::Basic => basic(domain),
        RobotsProfile::VideoGreeting => video_greeting(domain),
    }
}

/// Custom rules; sitemaps default to the domain's `/sitemap.xml`
pub fn custom(domain: &str, rules: Vec<UserAgentRule>, sitemaps: &[String]) -> String {
    let mut builder = rules.into_iter().fold(RobotsBuilder::new(), RobotsBuilder::rule);
    if sitemaps.is_empty() {
        builder = builder.sitemap(format!("https://{}/sitemap.xml", domain));
    }
    for sitemap in sitemaps {
        builder = builder.sitemap(sitemap.clone());
    }
    builder.build()
}

fn directive(line: &str) -> Option<(String, &str)> {
    let caps = DIRECTIVE.captures(line)?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    Some((name, value))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub has_user_agent: bool,
    pub has_sitemap: bool,
    pub line_count: usize,
    pub issue_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: ValidationSummary,
}

pub fn validate(content: &str) -> RobotsValidation {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut has_user_agent = false;
    let mut has_sitemap = false;
    let mut in_group = false;
    let lines: Vec<&str> = content.split('\n').collect();

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;

        let Some((name, value)) = directive(line) else {
            warnings.push(format!("Line {}: unknown directive \"{}\"", number, line));
            continue;
        };

        match name.as_str() {
            "user-agent" => {
                has_user_agent = true;
                in_group = !value.is_empty();
                if value.is_empty() {
                    issues.push(format!("Line {}: empty User-agent value", number));
                }
            }
            "allow" | "disallow" => {
                if !in_group {
                    issues.push(format!(
                        "Line {}: Allow/Disallow must follow a User-agent line",
                        number
                    ));
                }
                if value.is_empty() {
                    warnings.push(format!("Line {}: empty path", number));
                }
            }
            "sitemap" => {
                has_sitemap = true;
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    issues.push(format!("Line {}: Sitemap must be an absolute URL", number));
                }
            }
            "crawl-delay" => {
                let valid = value.parse::<f64>().is_ok_and(|d| d.is_finite() && d >= 0.0);
                if !valid {
                    issues.push(format!(
                        "Line {}: Crawl-delay must be a non-negative number",
                        number
                    ));
                }
            }
            "host" => {}
            _ => warnings.push(format!("Line {}: unknown directive \"{}\"", number, line)),
        }
    }

    if !has_user_agent {
        issues.push("Missing User-agent directive".to_string());
    }
    if !has_sitemap {
        warnings.push("Consider adding a Sitemap directive".to_string());
    }

    RobotsValidation {
        is_valid: issues.is_empty(),
        summary: ValidationSummary {
            has_user_agent,
            has_sitemap,
            line_count: lines.len(),
            issue_count: issues.len(),
            warning_count: warnings.len(),
        },
        issues,
        warnings,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathRuleKind {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRule {
    #[serde(rename = "type")]
    pub kind: PathRuleKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentGroup {
    pub user_agent: String,
    pub rules: Vec<PathRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsAnalysis {
    pub user_agents: Vec<AgentGroup>,
    pub sitemaps: Vec<String>,
    pub crawl_delays: BTreeMap<String, u32>,
    pub host: Option<String>,
    pub total_lines: usize,
    pub comment_lines: usize,
    pub empty_lines: usize,
}

pub fn analyze(content: &str) -> RobotsAnalysis {
    let mut analysis = RobotsAnalysis::default();
    let mut current: Option<AgentGroup> = None;

    for raw in content.split('\n') {
        analysis.total_lines += 1;
        let line = raw.trim();
        if line.is_empty() {
            analysis.empty_lines += 1;
            continue;
        }
        if line.starts_with('#') {
            analysis.comment_lines += 1;
            continue;
        }
        let Some((name, value)) = directive(line) else {
            continue;
        };

        match name.as_str() {
            "user-agent" => {
                if let Some(group) = current.take() {
                    analysis.user_agents.push(group);
                }
                current = Some(AgentGroup {
                    user_agent: value.to_string(),
                    rules: Vec::new(),
                });
            }
            "allow" | "disallow" => {
                if let Some(group) = current.as_mut() {
                    group.rules.push(PathRule {
                        kind: if name == "allow" {
                            PathRuleKind::Allow
                        } else {
                            PathRuleKind::Disallow
                        },
                        path: value.to_string(),
                    });
                }
            }
            "crawl-delay" => {
                if let (Some(group), Ok(delay)) = (current.as_ref(), value.parse::<u32>()) {
                    analysis.crawl_delays.insert(group.user_agent.clone(), delay);
                }
            }
            "sitemap" => analysis.sitemaps.push(value.to_string()),
            "host" => analysis.host = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(group) = current {
        analysis.user_agents.push(group);
    }
    analysis
}

/// Whether `agent` may fetch `path_or_url` under `content`
pub fn is_allowed(content: &str, agent: &str, path_or_url: &str) -> bool {
    let url = if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        path_or_url.to_string()
    } else {
        format!("http://robots.local/{}", path_or_url.trim_start_matches('/'))
    };
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(content, agent, &url)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsSuggestions {
    pub essential: Vec<String>,
    pub recommended: Vec<String>,
    pub advanced: Vec<String>,
    pub sample_robots: String,
}

pub fn optimization_suggestions(domain: &str, profile: RobotsProfile) -> RobotsSuggestions {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    RobotsSuggestions {
        essential: owned(&[
            "Include a User-agent: * group",
            "Reference the main sitemap URL",
            "Block sensitive directories such as /admin/ and /private/",
        ]),
        recommended: owned(&[
            "Set a crawl delay for the major search engines",
            "Allow important static assets (CSS, JS, images)",
            "Block temporary and backup files",
        ]),
        advanced: owned(&[
            "Add dedicated groups for media and social crawlers",
            "Use wildcard patterns to keep path rules short",
            "Review robots.txt whenever the site structure changes",
        ]),
        sample_robots: generate(profile, domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_layout() {
        let robots = basic("wishesvideo.com");
        assert!(robots.starts_with("User-agent: *\nAllow: /\nDisallow: /admin/\n"));
        assert!(robots.contains("User-agent: Bingbot\nAllow: /\nCrawl-delay: 2\n\n"));
        assert!(robots.ends_with(
            "Sitemap: https://wishesvideo.com/sitemap.xml\nSitemap: https://wishesvideo.com/sitemap-index.xml\n"
        ));
    }

    #[test]
    fn test_generated_profiles_validate() {
        for profile in [RobotsProfile::Basic, RobotsProfile::VideoGreeting] {
            let result = validate(&generate(profile, "wishesvideo.com"));
            assert!(result.is_valid, "{:?}: {:?}", profile, result.issues);
            assert!(result.warnings.is_empty());
        }
    }

    #[test]
    fn test_validation_issues() {
        let content = "Disallow: /x\nUser-agent: *\nCrawl-delay: -1\nCrawl-delay: soon\nSitemap: /sitemap.xml\nNoindex: /y\n";
        let result = validate(content);

        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 4);
        assert!(result.issues[0].starts_with("Line 1"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Noindex"));
        assert!(result.summary.has_sitemap);
    }

    #[test]
    fn test_missing_user_agent_and_sitemap() {
        let result = validate("# nothing here\n");
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["Missing User-agent directive".to_string()]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_groups() {
        let analysis = analyze(&video_greeting("wishesvideo.com"));
        assert_eq!(analysis.user_agents.len(), 8);
        assert_eq!(analysis.sitemaps.len(), 3);
        assert_eq!(analysis.crawl_delays.get("Googlebot"), Some(&1));
        assert_eq!(analysis.user_agents[6].user_agent, "AhrefsBot");
        assert_eq!(analysis.user_agents[6].rules[0].kind, PathRuleKind::Disallow);
    }

    #[test]
    fn test_custom_dedups_sitemaps() {
        let robots = custom(
            "example.com",
            vec![UserAgentRule::new("*").disallow("/cart/")],
            &["https://example.com/a.xml".to_string(), "https://example.com/a.xml".to_string()],
        );
        assert_eq!(robots.matches("Sitemap:").count(), 1);
        assert!(robots.contains("Disallow: /cart/"));
    }

    #[test]
    fn test_is_allowed() {
        let robots = video_greeting("wishesvideo.com");
        assert!(is_allowed(&robots, "Googlebot", "/videos/birthday"));
        assert!(!is_allowed(&robots, "AhrefsBot", "/"));
        assert!(!is_allowed(&robots, "SEOSentinel", "/admin/users"));
        assert!(is_allowed(&robots, "SEOSentinel", "https://wishesvideo.com/pricing"));
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("video-greeting".parse::<RobotsProfile>(), Ok(RobotsProfile::VideoGreeting));
        assert!("fancy".parse::<RobotsProfile>().is_err());
    }
}
