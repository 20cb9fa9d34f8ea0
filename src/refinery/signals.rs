// * Page signal extraction
// * Everything the scorer looks at, pulled from one parsed document.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::engine::normalization::{classify_link, LinkKind};

static SELECTOR_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static SELECTOR_META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static SELECTOR_IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static SELECTOR_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SELECTOR_CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());
static SELECTOR_JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static SELECTOR_HEADINGS: LazyLock<[Selector; 6]> = LazyLock::new(|| {
    [
        Selector::parse("h1").unwrap(),
        Selector::parse("h2").unwrap(),
        Selector::parse("h3").unwrap(),
        Selector::parse("h4").unwrap(),
        Selector::parse("h5").unwrap(),
        Selector::parse("h6").unwrap(),
    ]
});

/// One `<img>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    /// True iff `alt` is present and non-empty
    pub has_alt: bool,
}

/// Anchor counts by destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub internal: usize,
    pub external: usize,
    pub nofollow: usize,
}

/// Raw SEO signals of a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    pub title: String,
    pub meta_description: String,
    pub meta_keywords: Vec<String>,
    pub canonical_url: Option<String>,
    /// h1..h6 -> trimmed text in document order; every level is present
    pub headings: BTreeMap<String, Vec<String>>,
    pub images: Vec<ImageInfo>,
    /// og:* and twitter:* keys; last occurrence wins
    pub social_meta: BTreeMap<String, String>,
    /// Parsed JSON-LD blocks; malformed blocks are dropped
    pub structured_data_blocks: Vec<Value>,
    pub links: LinkSummary,
}

impl PageSignals {
    pub fn h1_count(&self) -> usize {
        self.headings.get("h1").map_or(0, Vec::len)
    }

    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|img| !img.has_alt).count()
    }
}

/// Extracts [`PageSignals`] from HTML. Never fails; missing things stay empty.
pub struct SignalExtractor;

impl SignalExtractor {
    pub fn extract(html: &str, page_url: &str) -> PageSignals {
        let document = Html::parse_document(html);

        PageSignals {
            title: Self::extract_title(&document),
            meta_description: Self::named_meta(&document, "description").unwrap_or_default(),
            meta_keywords: Self::extract_keywords(&document),
            canonical_url: Self::extract_canonical(&document),
            headings: Self::extract_headings(&document),
            images: Self::extract_images(&document),
            social_meta: Self::extract_social(&document),
            structured_data_blocks: Self::extract_json_ld(&document),
            links: Self::extract_links(&document, page_url),
        }
    }

    fn element_text(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    fn extract_title(document: &Html) -> String {
        document
            .select(&SELECTOR_TITLE)
            .next()
            .map(Self::element_text)
            .unwrap_or_default()
    }

    // * First <meta name=".."> match, case-insensitive on the name.
    fn named_meta(document: &Html, name: &str) -> Option<String> {
        document
            .select(&SELECTOR_META)
            .find(|meta| {
                meta.value()
                    .attr("name")
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .and_then(|meta| meta.value().attr("content"))
            .map(|content| content.trim().to_string())
    }

    fn extract_keywords(document: &Html) -> Vec<String> {
        Self::named_meta(document, "keywords")
            .map(|content| {
                content
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_canonical(document: &Html) -> Option<String> {
        document
            .select(&SELECTOR_CANONICAL)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(str::to_string)
    }

    fn extract_headings(document: &Html) -> BTreeMap<String, Vec<String>> {
        SELECTOR_HEADINGS
            .iter()
            .enumerate()
            .map(|(i, selector)| {
                let texts = document.select(selector).map(Self::element_text).collect();
                (format!("h{}", i + 1), texts)
            })
            .collect()
    }

    fn extract_images(document: &Html) -> Vec<ImageInfo> {
        document
            .select(&SELECTOR_IMG)
            .map(|img| {
                let alt = img.value().attr("alt").unwrap_or("").to_string();
                ImageInfo {
                    src: img.value().attr("src").unwrap_or("").to_string(),
                    has_alt: !alt.is_empty(),
                    alt,
                }
            })
            .collect()
    }

    // * og:* comes from `property`, twitter:* from `name`.
    // * Some sites put twitter tags in `property`; accept that too.
    fn extract_social(document: &Html) -> BTreeMap<String, String> {
        let mut social = BTreeMap::new();
        for meta in document.select(&SELECTOR_META) {
            let attrs = meta.value();
            let key = attrs
                .attr("property")
                .filter(|p| p.starts_with("og:") || p.starts_with("twitter:"))
                .or_else(|| attrs.attr("name").filter(|n| n.starts_with("twitter:")));

            if let (Some(key), Some(content)) = (key, attrs.attr("content")) {
                social.insert(key.to_string(), content.to_string());
            }
        }
        social
    }

    fn extract_json_ld(document: &Html) -> Vec<Value> {
        document
            .select(&SELECTOR_JSON_LD)
            .filter_map(|script| {
                let raw = script.text().collect::<String>();
                match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping malformed JSON-LD block");
                        None
                    }
                }
            })
            .collect()
    }

    fn extract_links(document: &Html, page_url: &str) -> LinkSummary {
        let mut summary = LinkSummary::default();
        for anchor in document.select(&SELECTOR_LINK) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            match classify_link(href, page_url) {
                LinkKind::Internal => summary.internal += 1,
                LinkKind::External => summary.external += 1,
                LinkKind::Other => continue,
            }
            let nofollow = anchor
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("nofollow")));
            if nofollow {
                summary.nofollow += 1;
            }
        }
        summary
    }
}
