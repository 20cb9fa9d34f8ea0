// * Page SEO Scorer
// * Signals -> weighted sub-scores -> issues -> recommendations.
// * Pure: no I/O, no shared state. Safe to call from any number of tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, MAX_SCORE, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
use crate::engine::fingerprint::compute_signal_fingerprint;
use crate::refinery::signals::{PageSignals, SignalExtractor};

// * Sub-score weights. They sum to MAX_SCORE.
const TITLE_POINTS: u8 = 20;
const TITLE_PARTIAL_POINTS: u8 = 10;
const DESCRIPTION_POINTS: u8 = 20;
const DESCRIPTION_PARTIAL_POINTS: u8 = 10;
const H1_POINTS: u8 = 15;
const H1_MULTIPLE_POINTS: u8 = 8;
const IMAGE_POINTS: u8 = 15;
const IMAGE_MISSING_ALT_PENALTY: usize = 2;
const STRUCTURED_DATA_POINTS: u8 = 15;

// * Social tags and their partial credit (max 15).
const SOCIAL_TAG_POINTS: [(&str, u8); 4] = [
    ("og:title", 4),
    ("og:description", 4),
    ("og:image", 4),
    ("twitter:card", 3),
];
const SOCIAL_ISSUE_BELOW: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Title,
    Meta,
    Heading,
    Images,
    Social,
    Structured,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Title => "title",
            RecommendationType::Meta => "meta",
            RecommendationType::Heading => "heading",
            RecommendationType::Images => "images",
            RecommendationType::Social => "social",
            RecommendationType::Structured => "structured",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub suggestion: String,
}

// * Issue keyword -> recommendation. Matched as a case-insensitive substring.
struct RecommendationRule {
    keyword: &'static str,
    kind: RecommendationType,
    priority: Priority,
    suggestion: &'static str,
}

const RECOMMENDATION_RULES: [RecommendationRule; 6] = [
    RecommendationRule {
        keyword: "title",
        kind: RecommendationType::Title,
        priority: Priority::High,
        suggestion: "Write a unique title of 30-60 characters that leads with the primary keyword",
    },
    RecommendationRule {
        keyword: "meta description",
        kind: RecommendationType::Meta,
        priority: Priority::High,
        suggestion: "Write a meta description of 120-160 characters with the primary keyword and a call to action",
    },
    RecommendationRule {
        keyword: "h1",
        kind: RecommendationType::Heading,
        priority: Priority::Medium,
        suggestion: "Use exactly one H1 that states the page topic; demote the rest to H2",
    },
    RecommendationRule {
        keyword: "alt attribute",
        kind: RecommendationType::Images,
        priority: Priority::Medium,
        suggestion: "Add descriptive alt text to every image",
    },
    RecommendationRule {
        keyword: "social",
        kind: RecommendationType::Social,
        priority: Priority::Medium,
        suggestion: "Add Open Graph (og:title, og:description, og:image) and twitter:card tags",
    },
    RecommendationRule {
        keyword: "structured data",
        kind: RecommendationType::Structured,
        priority: Priority::Low,
        suggestion: "Add JSON-LD structured data describing the organization, service or product",
    },
];

/// Points earned per signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub title: u8,
    pub meta_description: u8,
    pub headings: u8,
    pub images: u8,
    pub social: u8,
    pub structured_data: u8,
}

impl ScoreBreakdown {
    /// Sum of sub-scores, clamped to 100
    pub fn total(&self) -> u8 {
        let sum: u32 = [
            self.title,
            self.meta_description,
            self.headings,
            self.images,
            self.social,
            self.structured_data,
        ]
        .iter()
        .map(|&p| u32::from(p))
        .sum();
        sum.min(MAX_SCORE) as u8
    }
}

/// Result of one scoring call. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub signals: PageSignals,
    /// Always within 0..=100
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    pub issues: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    /// Hex xxh64 of the SEO signals
    pub fingerprint: String,
    /// Fetch time, when the HTML came from the network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time_ms: Option<u64>,
}

impl PageAnalysis {
    pub fn title(&self) -> &str {
        &self.signals.title
    }

    pub fn meta_description(&self) -> &str {
        &self.signals.meta_description
    }
}

/// Scores a document. Tolerates any HTML; never fails.
pub fn analyze(html: &str, url: &str) -> PageAnalysis {
    analyze_at(html, url, Utc::now())
}

/// [`analyze`] with an explicit timestamp
pub fn analyze_at(html: &str, url: &str, timestamp: DateTime<Utc>) -> PageAnalysis {
    let signals = SignalExtractor::extract(html, url);
    let (breakdown, issues) = score_signals(&signals);
    let recommendations = recommendations_for(&issues);
    let fingerprint = format!("{:016x}", compute_signal_fingerprint(&signals));

    tracing::debug!(url = %url, score = breakdown.total(), issues = issues.len(), "Page scored");

    PageAnalysis {
        url: url.to_string(),
        timestamp,
        score: breakdown.total(),
        signals,
        breakdown,
        issues,
        recommendations,
        fingerprint,
        load_time_ms: None,
    }
}

/// Computes sub-scores and one issue per shortfall, in signal order.
pub fn score_signals(signals: &PageSignals) -> (ScoreBreakdown, Vec<String>) {
    let mut breakdown = ScoreBreakdown::default();
    let mut issues = Vec::new();

    // * Title
    let title_len = signals.title.chars().count();
    if title_len == 0 {
        issues.push("Missing page title".to_string());
    } else if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_len) {
        breakdown.title = TITLE_POINTS;
    } else {
        breakdown.title = TITLE_PARTIAL_POINTS;
        issues.push(format!(
            "Title length is {} characters (recommended {}-{})",
            title_len, TITLE_MIN_CHARS, TITLE_MAX_CHARS
        ));
    }

    // * Meta description
    let description_len = signals.meta_description.chars().count();
    if description_len == 0 {
        issues.push("Missing meta description".to_string());
    } else if (DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&description_len) {
        breakdown.meta_description = DESCRIPTION_POINTS;
    } else {
        breakdown.meta_description = DESCRIPTION_PARTIAL_POINTS;
        issues.push(format!(
            "Meta description length is {} characters (recommended {}-{})",
            description_len, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS
        ));
    }

    // * H1
    match signals.h1_count() {
        0 => issues.push("Missing H1 heading".to_string()),
        1 => breakdown.headings = H1_POINTS,
        n => {
            breakdown.headings = H1_MULTIPLE_POINTS;
            issues.push(format!("Multiple H1 headings found ({})", n));
        }
    }

    // * Images; a page without images neither earns nor loses anything
    if !signals.images.is_empty() {
        let missing = signals.images_missing_alt();
        let penalty = missing.saturating_mul(IMAGE_MISSING_ALT_PENALTY);
        breakdown.images = usize::from(IMAGE_POINTS).saturating_sub(penalty) as u8;
        if missing > 0 {
            issues.push(format!("{} images missing alt attribute", missing));
        }
    }

    // * Social tags
    breakdown.social = SOCIAL_TAG_POINTS
        .iter()
        .filter(|(key, _)| {
            signals
                .social_meta
                .get(*key)
                .is_some_and(|content| !content.trim().is_empty())
        })
        .map(|(_, points)| points)
        .sum();
    if breakdown.social < SOCIAL_ISSUE_BELOW {
        issues.push("Incomplete social media tags (Open Graph / Twitter Card)".to_string());
    }

    // * Structured data
    if signals.structured_data_blocks.is_empty() {
        issues.push("Missing structured data (JSON-LD)".to_string());
    } else {
        breakdown.structured_data = STRUCTURED_DATA_POINTS;
    }

    (breakdown, issues)
}

/// Maps issues to recommendations through the keyword table.
pub fn recommendations_for(issues: &[String]) -> Vec<Recommendation> {
    issues
        .iter()
        .flat_map(|issue| {
            let lower = issue.to_lowercase();
            RECOMMENDATION_RULES
                .iter()
                .filter(move |rule| lower.contains(rule.keyword))
                .map(|rule| Recommendation {
                    kind: rule.kind,
                    priority: rule.priority,
                    suggestion: rule.suggestion.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://wishesvideo.com/";

    fn complete_page(h1s: &str, images: &str) -> String {
        let title = "t".repeat(45);
        let description = "d".repeat(140);
        format!(
            r#"<html><head>
                <title>{title}</title>
                <meta name="description" content="{description}">
                <meta property="og:title" content="Wishes">
                <meta property="og:description" content="Videos">
                <meta property="og:image" content="https://wishesvideo.com/og.jpg">
                <meta name="twitter:card" content="summary_large_image">
                <script type="application/ld+json">{{"@context":"https://schema.org","@type":"Organization","name":"Wishes"}}</script>
            </head><body>{h1s}{images}</body></html>"#
        )
    }

    #[test]
    fn test_complete_page_scores_100() {
        let html = complete_page("<h1>Main</h1>", r#"<img src="a.jpg" alt="A"><img src="b.jpg" alt="B">"#);
        let analysis = analyze(&html, URL);

        assert_eq!(analysis.score, 100);
        assert!(analysis.issues.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.breakdown.images, 15);
    }

    #[test]
    fn test_empty_page_scores_zero() {
        let analysis = analyze("<html><head></head><body></body></html>", URL);

        assert_eq!(analysis.score, 0);
        let joined = analysis.issues.join("\n");
        assert!(joined.contains("Missing page title"));
        assert!(joined.contains("Missing meta description"));
        assert!(joined.contains("Missing H1 heading"));
        assert!(joined.contains("Missing structured data"));
        assert!(joined.contains("social media"));
        assert!(!joined.contains("alt attribute"));
    }

    #[test]
    fn test_two_h1_scores_93() {
        let html = complete_page("<h1>One</h1><h1>Two</h1>", r#"<img src="a.jpg" alt="A">"#);
        let analysis = analyze(&html, URL);

        assert_eq!(analysis.breakdown.headings, 8);
        assert_eq!(analysis.score, 93);
        assert_eq!(analysis.issues, vec!["Multiple H1 headings found (2)".to_string()]);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].kind, RecommendationType::Heading);
        assert_eq!(analysis.recommendations[0].priority, Priority::Medium);
    }

    #[test]
    fn test_image_alt_penalty() {
        let images = r#"<img src="1.jpg" alt="one"><img src="2.jpg"><img src="3.jpg" alt=""><img src="4.jpg" alt="four">"#;
        let analysis = analyze(&complete_page("<h1>Main</h1>", images), URL);

        assert_eq!(analysis.breakdown.images, 11);
        assert_eq!(analysis.score, 96);
        assert!(analysis.issues.contains(&"2 images missing alt attribute".to_string()));
        assert_eq!(analysis.recommendations[0].kind, RecommendationType::Images);
    }

    #[test]
    fn test_image_penalty_floors_at_zero() {
        let images = "<img src=\"x.jpg\">".repeat(10);
        let analysis = analyze(&complete_page("<h1>Main</h1>", &images), URL);
        assert_eq!(analysis.breakdown.images, 0);
    }

    #[test]
    fn test_no_images_no_issue() {
        let analysis = analyze(&complete_page("<h1>Main</h1>", ""), URL);
        assert_eq!(analysis.breakdown.images, 0);
        assert_eq!(analysis.score, 85);
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn test_title_out_of_range() {
        let html = "<title>Too short</title>";
        let analysis = analyze(html, URL);

        assert_eq!(analysis.breakdown.title, 10);
        assert!(analysis.issues[0].starts_with("Title length is 9 characters"));
        assert_eq!(analysis.recommendations[0].kind, RecommendationType::Title);
        assert_eq!(analysis.recommendations[0].priority, Priority::High);
    }

    #[test]
    fn test_title_length_counts_characters() {
        // * 30 multi-byte characters sit inside the window even though they exceed 60 bytes
        let html = format!("<title>{}</title>", "é".repeat(30));
        let analysis = analyze(&html, URL);
        assert_eq!(analysis.breakdown.title, 20);
    }

    #[test]
    fn test_description_partial_credit() {
        let html = r#"<meta name="description" content="Short description">"#;
        let analysis = analyze(html, URL);

        assert_eq!(analysis.breakdown.meta_description, 10);
        let meta_recs: Vec<_> = analysis
            .recommendations
            .iter()
            .filter(|r| r.kind == RecommendationType::Meta)
            .collect();
        assert_eq!(meta_recs.len(), 1);
    }

    #[test]
    fn test_social_partial_credit() {
        let html = r#"<meta property="og:title" content="A"><meta name="twitter:card" content="summary">"#;
        let analysis = analyze(html, URL);

        assert_eq!(analysis.breakdown.social, 7);
        assert!(analysis.issues.iter().any(|i| i.contains("social media")));
    }

    #[test]
    fn test_empty_social_content_earns_nothing() {
        let html = r#"<meta property="og:title" content="">
            <meta property="og:description" content=" ">
            <meta property="og:image" content="">
            <meta name="twitter:card" content="summary">"#;
        let analysis = analyze(html, URL);

        assert_eq!(analysis.breakdown.social, 3);
        assert!(analysis.issues.iter().any(|i| i.contains("social media")));
    }

    #[test]
    fn test_structured_data_recommendation_is_low() {
        let recs = recommendations_for(&["Missing structured data (JSON-LD)".to_string()]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Low);
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let breakdown = ScoreBreakdown {
            title: 200,
            meta_description: 200,
            headings: 200,
            images: 200,
            social: 200,
            structured_data: 200,
        };
        assert_eq!(breakdown.total(), 100);
    }

    #[test]
    fn test_idempotent_for_fixed_input() {
        let html = complete_page("<h1>A</h1><h1>B</h1>", r#"<img src="x.jpg">"#);
        let ts = Utc::now();
        let a = analyze_at(&html, URL, ts);
        let b = analyze_at(&html, URL, ts);
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let analysis = analyze("<html><head><title>Broken<body><h1>x</h2><img", URL);
        assert!(analysis.score <= 100);
    }

    #[test]
    fn test_serialized_shape() {
        let analysis = analyze(&complete_page("<h1>Main</h1>", ""), URL);
        let json = serde_json::to_value(&analysis).unwrap();

        assert!(json.get("metaDescription").is_some());
        assert!(json.get("socialMeta").is_some());
        assert!(json.get("structuredDataBlocks").is_some());
        assert!(json["headings"].get("h1").is_some());
        assert!(json.get("loadTimeMs").is_none());
    }
}
