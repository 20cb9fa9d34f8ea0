// * Title and meta description optimization
// * Length windows match the page scorer; scores here are per field (0-100).

use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
use crate::engine::scorer::Priority;

const CALL_TO_ACTION: [&str; 8] = [
    "contact", "get", "discover", "learn", "start", "try", "book", "order",
];
const GENERIC_TITLE_WORDS: [&str; 2] = ["untitled", "home"];
const DEFAULT_BRAND: &str = "WishesVideo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSuggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub priority: Priority,
}

impl MetaSuggestion {
    fn new(kind: &str, message: String, priority: Priority) -> Self {
        Self {
            kind: kind.to_string(),
            message,
            priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptimization {
    pub current: Option<String>,
    pub length: usize,
    pub score: u8,
    pub suggestions: Vec<MetaSuggestion>,
    /// Suggested rewrite, when one differs from the current text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.trim().is_empty() && haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn char_len(text: Option<&str>) -> usize {
    text.map(|t| t.chars().count()).unwrap_or(0)
}

/// Cuts at the last word boundary that fits `max` characters
fn cut_at_word(text: &str, max: usize, suffix: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(suffix.chars().count());
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(budget).collect();
    }
    out.push_str(suffix);
    out
}

fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn title_score(title: Option<&str>, keywords: &[String]) -> u8 {
    let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
        return 0;
    };
    let length = title.chars().count();
    let mut score = 0u32;

    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
        score += 40;
    }
    score += 30 * keywords.iter().filter(|k| contains_ci(title, k)).count() as u32;
    if title.contains('|') || title.contains('-') {
        score += 15;
    }
    let lower = title.to_lowercase();
    if !GENERIC_TITLE_WORDS.iter().any(|w| lower.contains(w)) {
        score += 15;
    }

    score.min(100) as u8
}

pub fn description_score(description: Option<&str>, keywords: &[String]) -> u8 {
    let Some(description) = description.filter(|d| !d.trim().is_empty()) else {
        return 0;
    };
    let length = description.chars().count();
    let mut score = 0u32;

    if (DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&length) {
        score += 50;
    }
    score += 25 * keywords.iter().filter(|k| contains_ci(description, k)).count() as u32;
    let lower = description.to_lowercase();
    if CALL_TO_ACTION.iter().any(|w| lower.contains(w)) {
        score += 25;
    }

    score.min(100) as u8
}

pub fn optimize_title(title: Option<&str>, keywords: &[String], brand: &str) -> FieldOptimization {
    let length = char_len(title);
    let mut suggestions = Vec::new();

    if length < TITLE_MIN_CHARS {
        suggestions.push(MetaSuggestion::new(
            "title_too_short",
            format!("Title is too short; use at least {} characters", TITLE_MIN_CHARS),
            Priority::High,
        ));
    }
    if length > TITLE_MAX_CHARS {
        suggestions.push(MetaSuggestion::new(
            "title_too_long",
            format!("Title is too long; keep it under {} characters", TITLE_MAX_CHARS),
            Priority::High,
        ));
    }
    let has_keyword = title.is_some_and(|t| keywords.iter().any(|k| contains_ci(t, k)));
    if !keywords.is_empty() && !has_keyword {
        suggestions.push(MetaSuggestion::new(
            "missing_keywords",
            "Title does not include a primary keyword".to_string(),
            Priority::Medium,
        ));
    }

    // * Rewrite: primary keyword first, brand last, within the length window
    let optimized = if suggestions.is_empty() {
        None
    } else {
        let base = title.map(str::trim).filter(|t| !t.is_empty());
        let primary = keywords.first().map(|k| capitalize_words(k));
        let mut parts: Vec<String> = Vec::new();
        if let Some(kw) = primary.filter(|_| !has_keyword) {
            parts.push(kw);
        }
        if let Some(base) = base {
            parts.push(base.to_string());
        }
        if !parts.iter().any(|p| contains_ci(p, brand)) {
            parts.push(brand.to_string());
        }
        Some(cut_at_word(&parts.join(" | "), TITLE_MAX_CHARS, ""))
    };

    FieldOptimization {
        current: title.map(str::to_string),
        length,
        score: title_score(title, keywords),
        suggestions,
        optimized,
    }
}

pub fn optimize_description(description: Option<&str>, keywords: &[String]) -> FieldOptimization {
    let length = char_len(description);
    let mut suggestions = Vec::new();

    if length < DESCRIPTION_MIN_CHARS {
        suggestions.push(MetaSuggestion::new(
            "description_too_short",
            format!(
                "Description is too short; use at least {} characters",
                DESCRIPTION_MIN_CHARS
            ),
            Priority::High,
        ));
    }
    if length > DESCRIPTION_MAX_CHARS {
        suggestions.push(MetaSuggestion::new(
            "description_too_long",
            format!(
                "Description is too long; keep it under {} characters",
                DESCRIPTION_MAX_CHARS
            ),
            Priority::High,
        ));
    }
    let has_keyword = description.is_some_and(|d| keywords.iter().any(|k| contains_ci(d, k)));
    if !keywords.is_empty() && !has_keyword {
        suggestions.push(MetaSuggestion::new(
            "missing_keywords",
            "Description does not include a primary keyword".to_string(),
            Priority::Medium,
        ));
    }

    let optimized = match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(text) if length > DESCRIPTION_MAX_CHARS => {
            Some(cut_at_word(text, DESCRIPTION_MAX_CHARS, "..."))
        }
        _ => None,
    };

    FieldOptimization {
        current: description.map(str::to_string),
        length,
        score: description_score(description, keywords),
        suggestions,
        optimized,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTemplate {
    pub title: String,
    pub description: String,
}

/// Starter copy per industry; `{brand}` and `{keyword}` are filled in
pub fn template_for(industry: &str, brand: &str, keyword: &str) -> MetaTemplate {
    let (title, description) = match industry {
        "video-greeting" => (
            "Custom Video Messages & Personalized Greetings | {brand}",
            "Create personalized video messages and custom greetings for any occasion. Professional video creators from around the world ready to make your special moments unforgettable.",
        ),
        _ => (
            "{keyword} | Professional Services | {brand}",
            "Discover professional {keyword} services. Get expert solutions tailored to your needs with guaranteed quality and customer satisfaction.",
        ),
    };
    let fill = |s: &str| s.replace("{brand}", brand).replace("{keyword}", keyword);
    MetaTemplate {
        title: fill(title),
        description: fill(description),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub industry: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaOptimization {
    pub title: FieldOptimization,
    pub description: FieldOptimization,
    pub template: MetaTemplate,
}

pub fn optimize(request: &MetaRequest) -> MetaOptimization {
    let brand = request.brand.as_deref().unwrap_or(DEFAULT_BRAND);
    let keyword = request
        .keywords
        .first()
        .map(|k| capitalize_words(k))
        .unwrap_or_else(|| "Video Greetings".to_string());
    MetaOptimization {
        title: optimize_title(request.title.as_deref(), &request.keywords, brand),
        description: optimize_description(request.description.as_deref(), &request.keywords),
        template: template_for(
            request.industry.as_deref().unwrap_or("general"),
            brand,
            &keyword,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_score_components() {
        let title = "Personalized Video Messages | WishesVideo";
        assert_eq!(title_score(Some(title), &kw(&["personalized video"])), 100);
        assert_eq!(title_score(Some(title), &[]), 70);
        assert_eq!(title_score(Some("Home"), &[]), 0);
        assert_eq!(title_score(None, &kw(&["video"])), 0);
    }

    #[test]
    fn test_description_score_components() {
        let description = format!("Order a personalized video greeting today. {}", "x".repeat(90));
        assert_eq!(description.chars().count(), 133);
        assert_eq!(description_score(Some(&description), &kw(&["video greeting"])), 100);
        assert_eq!(description_score(Some("Nice videos"), &[]), 0);
    }

    #[test]
    fn test_optimize_title_rewrites() {
        let result = optimize_title(Some("Welcome"), &kw(&["birthday video messages"]), "WishesVideo");

        assert_eq!(result.length, 7);
        let kinds: Vec<&str> = result.suggestions.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["title_too_short", "missing_keywords"]);
        assert_eq!(
            result.optimized.as_deref(),
            Some("Birthday Video Messages | Welcome | WishesVideo")
        );
    }

    #[test]
    fn test_good_title_untouched() {
        let result = optimize_title(
            Some("Birthday Video Messages from Real People | WishesVideo"),
            &kw(&["birthday video"]),
            "WishesVideo",
        );
        assert!(result.suggestions.is_empty());
        assert!(result.optimized.is_none());
    }

    #[test]
    fn test_long_description_cut_at_word() {
        let long = "word ".repeat(50);
        let result = optimize_description(Some(long.trim()), &[]);
        let optimized = result.optimized.unwrap();

        assert!(optimized.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert!(optimized.ends_with("word..."));
        assert_eq!(result.suggestions[0].kind, "description_too_long");
    }

    #[test]
    fn test_templates() {
        let template = template_for("general", "Acme", "Dance Greetings");
        assert_eq!(template.title, "Dance Greetings | Professional Services | Acme");
        let video = template_for("video-greeting", "WishesVideo", "x");
        assert!(video.title.ends_with("| WishesVideo"));
    }
}
