// * Visible text extraction for keyword analysis
// * Body text minus script/style/template content, plus the first paragraph.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

static SELECTOR_BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static SELECTOR_PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

// * Elements whose text never reaches the reader
const HIDDEN_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// Text a visitor would read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleText {
    /// Whitespace-collapsed body text
    pub text: String,
    /// First non-empty `<p>`
    pub first_paragraph: String,
}

impl VisibleText {
    pub fn extract(html: &str) -> Self {
        let document = Html::parse_document(html);

        let mut raw = String::new();
        if let Some(body) = document.select(&SELECTOR_BODY).next() {
            for node in body.descendants() {
                let Some(text) = node.value().as_text() else {
                    continue;
                };
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
                });
                if !hidden {
                    raw.push_str(text);
                    raw.push(' ');
                }
            }
        }

        let first_paragraph = document
            .select(&SELECTOR_PARAGRAPHS)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .find(|p| !p.is_empty())
            .unwrap_or_default();

        Self {
            text: collapse_whitespace(&raw),
            first_paragraph,
        }
    }

    /// Plain text passes through unchanged (bar whitespace)
    pub fn from_plain(text: &str) -> Self {
        let text = collapse_whitespace(text);
        let first_paragraph = text.split(". ").next().unwrap_or("").to_string();
        Self {
            text,
            first_paragraph,
        }
    }

    /// Lowercased Unicode words
    pub fn words(&self) -> Vec<String> {
        tokenize(&self.text)
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_text_skipped() {
        let html = r#"<html><head><title>T</title></head><body>
            <p>Personalized   video
            messages</p>
            <script>var tracking = "ignore me";</script>
            <style>.x { color: red }</style>
            <div>Order today</div>
        </body></html>"#;

        let visible = VisibleText::extract(html);
        assert_eq!(visible.text, "Personalized video messages Order today");
        assert_eq!(visible.first_paragraph, "Personalized video messages");
    }

    #[test]
    fn test_words_unicode() {
        let visible = VisibleText::from_plain("Vidéo greetings, from Zambia! Don't wait.");
        assert_eq!(
            visible.words(),
            vec!["vidéo", "greetings", "from", "zambia", "don't", "wait"]
        );
    }

    #[test]
    fn test_empty() {
        let visible = VisibleText::extract("");
        assert!(visible.text.is_empty());
        assert!(visible.words().is_empty());
    }
}
