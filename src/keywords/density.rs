// * On-page keyword analysis
// * Occurrences, density and placement of target phrases in visible text

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::refinery::text::{tokenize, VisibleText};

// * Density window considered natural, in percent
const MIN_DENSITY_PERCENT: f64 = 0.5;
const MAX_DENSITY_PERCENT: f64 = 3.0;
const TOP_TERMS: usize = 10;
const MIN_WORDS_FOR_CONTENT: usize = 300;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in",
        "is", "it", "its", "of", "on", "or", "our", "that", "the", "this", "to", "was", "we",
        "with", "you", "your", "will", "can", "all", "more", "their", "they", "them",
    ]
    .into()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDensity {
    pub keyword: String,
    pub occurrences: usize,
    /// Percentage of words
    pub density: f64,
    pub in_title: bool,
    pub in_first_paragraph: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    pub word_count: usize,
    pub unique_words: usize,
    pub keywords: Vec<KeywordDensity>,
    /// Most frequent non-stop-words
    pub top_terms: Vec<TermCount>,
    pub suggestions: Vec<String>,
}

// * Counts phrase occurrences as consecutive token runs
fn count_phrase(words: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > words.len() {
        return 0;
    }
    words.windows(phrase.len()).filter(|w| *w == phrase).count()
}

fn contains_phrase(text: &str, phrase: &[String]) -> bool {
    count_phrase(&tokenize(text), phrase) > 0
}

/// Analyzes `content` against `targets`. `title` feeds the placement check.
pub fn analyze_keywords(content: &VisibleText, title: Option<&str>, targets: &[String]) -> KeywordAnalysis {
    let words = content.words();
    let word_count = words.len();
    let unique_words = words.iter().collect::<HashSet<_>>().len();

    let keywords: Vec<KeywordDensity> = targets
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|keyword| {
            let phrase = tokenize(keyword);
            let occurrences = count_phrase(&words, &phrase);
            let density = if word_count == 0 {
                0.0
            } else {
                occurrences as f64 / word_count as f64 * 100.0
            };
            KeywordDensity {
                keyword: keyword.clone(),
                occurrences,
                density: (density * 100.0).round() / 100.0,
                in_title: title.is_some_and(|t| contains_phrase(t, &phrase)),
                in_first_paragraph: contains_phrase(&content.first_paragraph, &phrase),
            }
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        if word.chars().count() > 2 && !STOP_WORDS.contains(word.as_str()) {
            *counts.entry(word.as_str()).or_default() += 1;
        }
    }
    let mut top_terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount {
            term: term.to_string(),
            count,
        })
        .collect();
    top_terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    top_terms.truncate(TOP_TERMS);

    let suggestions = suggestions_for(word_count, title.is_some(), &keywords);

    KeywordAnalysis {
        word_count,
        unique_words,
        keywords,
        top_terms,
        suggestions,
    }
}

fn suggestions_for(word_count: usize, has_title: bool, keywords: &[KeywordDensity]) -> Vec<String> {
    let mut suggestions = Vec::new();

    if word_count < MIN_WORDS_FOR_CONTENT {
        suggestions.push(format!(
            "Content has {} words; aim for at least {}",
            word_count, MIN_WORDS_FOR_CONTENT
        ));
    }

    for kw in keywords {
        if kw.occurrences == 0 {
            suggestions.push(format!("Keyword \"{}\" does not appear in the content", kw.keyword));
        } else if kw.density < MIN_DENSITY_PERCENT {
            suggestions.push(format!(
                "Use \"{}\" more often (density {:.2}%, target {}-{}%)",
                kw.keyword, kw.density, MIN_DENSITY_PERCENT, MAX_DENSITY_PERCENT
            ));
        } else if kw.density > MAX_DENSITY_PERCENT {
            suggestions.push(format!(
                "Reduce \"{}\" to avoid keyword stuffing (density {:.2}%)",
                kw.keyword, kw.density
            ));
        }
        if has_title && !kw.in_title {
            suggestions.push(format!("Add \"{}\" to the page title", kw.keyword));
        }
        if kw.occurrences > 0 && !kw.in_first_paragraph {
            suggestions.push(format!("Mention \"{}\" in the first paragraph", kw.keyword));
        }
    }

    suggestions
}
