// * Social preview tags: Open Graph and Twitter Cards
// * Generation with per-platform truncation, plus analysis of existing markup.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use super::escape_xml;

static SELECTOR_META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());

const REQUIRED_OPEN_GRAPH: [&str; 4] = ["title", "description", "image", "url"];
const REQUIRED_TWITTER: [&str; 4] = ["card", "title", "description", "image"];
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Twitter,
    Linkedin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Platform {
    pub fn title_limit(&self) -> usize {
        match self {
            Platform::Facebook => 100,
            Platform::Twitter => 70,
            Platform::Linkedin => 120,
        }
    }

    pub fn description_limit(&self) -> usize {
        match self {
            Platform::Facebook | Platform::Linkedin => 300,
            Platform::Twitter => 200,
        }
    }

    pub fn image_size(&self) -> ImageSize {
        match self {
            Platform::Facebook => ImageSize { width: 1200, height: 630 },
            Platform::Twitter => ImageSize { width: 1200, height: 600 },
            Platform::Linkedin => ImageSize { width: 1200, height: 627 },
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            other => Err(format!("Unsupported platform: {}", other)),
        }
    }
}

/// Page data the tags are built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    /// `website`, `video`, `article`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub site_name: Option<String>,
    pub locale: Option<String>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub author: Option<String>,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub section: Option<String>,
    pub tags: Vec<String>,
    pub keywords: Option<String>,
    pub card_type: Option<String>,
    pub twitter_site: Option<String>,
    pub twitter_creator: Option<String>,
    pub player_url: Option<String>,
    pub player_width: Option<u32>,
    pub player_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTag {
    /// `property` or `name`
    pub attribute: &'static str,
    pub key: String,
    pub content: String,
}

impl MetaTag {
    fn property(key: &str, content: impl Into<String>) -> Self {
        Self {
            attribute: "property",
            key: key.to_string(),
            content: content.into(),
        }
    }

    fn name(key: &str, content: impl Into<String>) -> Self {
        Self {
            attribute: "name",
            key: key.to_string(),
            content: content.into(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            "<meta {}=\"{}\" content=\"{}\">",
            self.attribute,
            escape_xml(&self.key),
            escape_xml(&self.content)
        )
    }
}

fn push_opt(tags: &mut Vec<MetaTag>, attribute: &'static str, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        tags.push(MetaTag {
            attribute,
            key: key.to_string(),
            content: v.clone(),
        });
    }
}

pub fn open_graph_tags(data: &SocialContent) -> Vec<MetaTag> {
    let kind = data.kind.as_deref().unwrap_or("website");
    let mut tags = Vec::new();
    push_opt(&mut tags, "property", "og:title", &data.title);
    push_opt(&mut tags, "property", "og:description", &data.description);
    push_opt(&mut tags, "property", "og:image", &data.image);
    push_opt(&mut tags, "property", "og:url", &data.url);
    tags.push(MetaTag::property("og:type", kind));
    push_opt(&mut tags, "property", "og:site_name", &data.site_name);
    tags.push(MetaTag::property(
        "og:locale",
        data.locale.as_deref().unwrap_or("en_US"),
    ));

    match kind {
        "video" => {
            push_opt(&mut tags, "property", "og:video", &data.video_url);
            tags.push(MetaTag::property(
                "og:video:type",
                data.video_type.as_deref().unwrap_or("video/mp4"),
            ));
            tags.push(MetaTag::property(
                "og:video:width",
                data.video_width.unwrap_or(1280).to_string(),
            ));
            tags.push(MetaTag::property(
                "og:video:height",
                data.video_height.unwrap_or(720).to_string(),
            ));
        }
        "article" => {
            push_opt(&mut tags, "property", "article:author", &data.author);
            push_opt(&mut tags, "property", "article:published_time", &data.published_time);
            push_opt(&mut tags, "property", "article:modified_time", &data.modified_time);
            push_opt(&mut tags, "property", "article:section", &data.section);
            for tag in &data.tags {
                tags.push(MetaTag::property("article:tag", tag.clone()));
            }
        }
        _ => {}
    }

    tags
}

pub fn twitter_card_tags(data: &SocialContent) -> Vec<MetaTag> {
    let card = data.card_type.as_deref().unwrap_or("summary_large_image");
    let mut tags = vec![MetaTag::name("twitter:card", card)];
    push_opt(&mut tags, "name", "twitter:title", &data.title);
    push_opt(&mut tags, "name", "twitter:description", &data.description);
    push_opt(&mut tags, "name", "twitter:image", &data.image);
    push_opt(&mut tags, "name", "twitter:site", &data.twitter_site);
    push_opt(&mut tags, "name", "twitter:creator", &data.twitter_creator);

    if card == "player" {
        push_opt(&mut tags, "name", "twitter:player", &data.player_url);
        tags.push(MetaTag::name(
            "twitter:player:width",
            data.player_width.unwrap_or(1280).to_string(),
        ));
        tags.push(MetaTag::name(
            "twitter:player:height",
            data.player_height.unwrap_or(720).to_string(),
        ));
    }

    tags
}

/// Open Graph + Twitter + the plain meta tags that accompany them
pub fn all_tags(data: &SocialContent) -> Vec<MetaTag> {
    let mut tags = open_graph_tags(data);
    tags.extend(twitter_card_tags(data));
    push_opt(&mut tags, "name", "description", &data.description);
    push_opt(&mut tags, "name", "keywords", &data.keywords);
    push_opt(&mut tags, "name", "author", &data.author);
    tags.push(MetaTag::name("robots", "index, follow"));
    tags
}

/// Renders tags as HTML lines; a canonical link is added when the URL is known
pub fn render(tags: &[MetaTag], canonical: Option<&str>) -> String {
    let mut lines: Vec<String> = tags.iter().map(MetaTag::to_html).collect();
    if let Some(url) = canonical {
        lines.push(format!("<link rel=\"canonical\" href=\"{}\">", escape_xml(url)));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoGreetingPage {
    pub occasion: String,
    pub creator: String,
    pub thumbnail: Option<String>,
    pub page_url: Option<String>,
    pub video_url: Option<String>,
}

pub fn video_greeting_tags(page: &VideoGreetingPage) -> Vec<MetaTag> {
    all_tags(&SocialContent {
        title: Some(format!("{} Video Message from {}", page.occasion, page.creator)),
        description: Some(format!(
            "Get a personalized {} video message from {}. Custom greetings for any special occasion.",
            page.occasion.to_lowercase(),
            page.creator
        )),
        image: page.thumbnail.clone(),
        url: page.page_url.clone(),
        kind: Some("video".to_string()),
        site_name: Some("WishesVideo".to_string()),
        video_url: page.video_url.clone(),
        author: Some(page.creator.clone()),
        keywords: Some(format!(
            "video message, {}, personalized greeting, custom video",
            page.occasion
        )),
        twitter_site: Some("@wishesvideo".to_string()),
        locale: Some("en_US".to_string()),
        ..Default::default()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContent {
    pub platform: Platform,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub recommended_image_size: ImageSize,
}

pub fn optimize_for_platform(data: &SocialContent, platform: Platform) -> PlatformContent {
    PlatformContent {
        platform,
        title: data.title.as_deref().map(|t| truncate(t, platform.title_limit())),
        description: data
            .description
            .as_deref()
            .map(|d| truncate(d, platform.description_limit())),
        image: data.image.clone(),
        recommended_image_size: platform.image_size(),
    }
}

/// Cuts to `max` characters, the last three replaced by an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialTagAnalysis {
    pub open_graph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn analyze_tags(html: &str) -> SocialTagAnalysis {
    let document = Html::parse_document(html);
    let mut analysis = SocialTagAnalysis::default();

    for meta in document.select(&SELECTOR_META) {
        let el = meta.value();
        let Some(content) = el.attr("content").filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        let key = el.attr("property").or_else(|| el.attr("name")).unwrap_or("");
        if let Some(og) = key.strip_prefix("og:") {
            analysis.open_graph.insert(og.to_string(), content.to_string());
        } else if let Some(tw) = key.strip_prefix("twitter:") {
            analysis.twitter.insert(tw.to_string(), content.to_string());
        }
    }

    for tag in REQUIRED_OPEN_GRAPH {
        if !analysis.open_graph.contains_key(tag) {
            analysis.missing.push(format!("og:{}", tag));
        }
    }
    for tag in REQUIRED_TWITTER {
        if !analysis.twitter.contains_key(tag) {
            analysis.missing.push(format!("twitter:{}", tag));
        }
    }

    if !analysis.missing.is_empty() {
        analysis
            .recommendations
            .push("Add the missing social media meta tags".to_string());
    }
    if analysis
        .open_graph
        .get("title")
        .is_some_and(|t| t.chars().count() > Platform::Facebook.title_limit())
    {
        analysis
            .recommendations
            .push("Shorten the Open Graph title".to_string());
    }
    if analysis
        .twitter
        .get("description")
        .is_some_and(|d| d.chars().count() > Platform::Twitter.description_limit())
    {
        analysis
            .recommendations
            .push("Shorten the Twitter description".to_string());
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> SocialContent {
        SocialContent {
            title: Some("Birthday Videos".to_string()),
            description: Some("Greetings \"made\" for you".to_string()),
            image: Some("https://x.com/og.jpg".to_string()),
            url: Some("https://x.com/birthday".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_graph_defaults_and_escaping() {
        let tags = open_graph_tags(&content());
        let html = render(&tags, None);

        assert!(html.contains("<meta property=\"og:type\" content=\"website\">"));
        assert!(html.contains("<meta property=\"og:locale\" content=\"en_US\">"));
        assert!(html.contains("content=\"Greetings &quot;made&quot; for you\""));
        assert!(!html.contains("og:site_name"));
    }

    #[test]
    fn test_video_and_player_extras() {
        let mut data = content();
        data.kind = Some("video".to_string());
        data.card_type = Some("player".to_string());
        data.player_url = Some("https://x.com/player".to_string());

        let og = open_graph_tags(&data);
        assert!(og.iter().any(|t| t.key == "og:video:type" && t.content == "video/mp4"));

        let tw = twitter_card_tags(&data);
        assert!(tw.iter().any(|t| t.key == "twitter:player:height" && t.content == "720"));
    }

    #[test]
    fn test_truncation() {
        assert_eq!(truncate("short", 70), "short");
        let long = "a".repeat(80);
        let cut = truncate(&long, 70);
        assert_eq!(cut.chars().count(), 70);
        assert!(cut.ends_with("..."));

        let mut data = content();
        data.description = Some("d".repeat(250));
        let twitter = optimize_for_platform(&data, Platform::Twitter);
        assert_eq!(twitter.description.map(|d| d.chars().count()), Some(200));
        assert_eq!(twitter.recommended_image_size.height, 600);
    }

    #[test]
    fn test_analyze_tags() {
        let html = r#"<html><head>
            <meta property="og:title" content="Hi">
            <meta property="og:image" content="https://x.com/i.jpg">
            <meta name="twitter:card" content="summary">
        </head></html>"#;
        let analysis = analyze_tags(html);

        assert_eq!(analysis.open_graph.len(), 2);
        assert_eq!(
            analysis.missing,
            vec!["og:description", "og:url", "twitter:title", "twitter:description", "twitter:image"]
        );
        assert_eq!(analysis.recommendations.len(), 1);
    }

    #[test]
    fn test_generated_tags_pass_analysis() {
        let page = VideoGreetingPage {
            occasion: "Birthday".to_string(),
            creator: "Chanda".to_string(),
            thumbnail: Some("https://x.com/t.jpg".to_string()),
            page_url: Some("https://x.com/v/1".to_string()),
            video_url: Some("https://x.com/v/1.mp4".to_string()),
        };
        let html = format!("<html><head>{}</head></html>", render(&video_greeting_tags(&page), None));
        let analysis = analyze_tags(&html);

        assert!(analysis.missing.is_empty(), "{:?}", analysis.missing);
        assert_eq!(analysis.open_graph["title"], "Birthday Video Message from Chanda");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("LinkedIn".parse::<Platform>(), Ok(Platform::Linkedin));
        assert!("myspace".parse::<Platform>().is_err());
    }
}
