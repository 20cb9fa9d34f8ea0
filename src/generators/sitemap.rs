// * XML sitemap generation and validation
// * urlset with optional image/video extensions, sitemap index, 50k-URL split

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::LazyLock;

use super::escape_xml;

pub const MAX_URLS_PER_SITEMAP: usize = 50_000;
const DEFAULT_PRIORITY: f32 = 0.5;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const NS_SITEMAP: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const NS_IMAGE: &str = "http://www.google.com/schemas/sitemap-image/1.1";
const NS_VIDEO: &str = "http://www.google.com/schemas/sitemap-video/1.1";

static URL_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<url>.*?</url>").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapVideo {
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_loc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_loc: Option<String>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SitemapEntry {
    pub url: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<f32>,
    pub images: Vec<SitemapImage>,
    pub videos: Vec<SitemapVideo>,
}

impl SitemapEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with(url: impl Into<String>, priority: f32, changefreq: ChangeFreq) -> Self {
        Self {
            url: url.into(),
            priority: Some(priority),
            changefreq: Some(changefreq),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SitemapOptions {
    pub include_images: bool,
    pub include_videos: bool,
}

pub fn generate(entries: &[SitemapEntry], options: SitemapOptions) -> String {
    generate_on(entries, options, Utc::now().date_naive())
}

/// Same as `generate` with a fixed default `lastmod`
pub fn generate_on(entries: &[SitemapEntry], options: SitemapOptions, today: NaiveDate) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = write!(xml, "<urlset xmlns=\"{}\"", NS_SITEMAP);
    if options.include_images {
        let _ = write!(xml, " xmlns:image=\"{}\"", NS_IMAGE);
    }
    if options.include_videos {
        let _ = write!(xml, " xmlns:video=\"{}\"", NS_VIDEO);
    }
    xml.push_str(">\n");

    let today = today.format("%Y-%m-%d").to_string();
    for entry in entries {
        write_entry(&mut xml, entry, options, &today);
    }

    xml.push_str("</urlset>");
    xml
}

fn write_entry(xml: &mut String, entry: &SitemapEntry, options: SitemapOptions, today: &str) {
    let lastmod = entry.lastmod.as_deref().unwrap_or(today);
    let changefreq = entry.changefreq.unwrap_or_default();
    let priority = entry.priority.unwrap_or(DEFAULT_PRIORITY).clamp(0.0, 1.0);

    xml.push_str("  <url>\n");
    let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.url));
    let _ = writeln!(xml, "    <lastmod>{}</lastmod>", escape_xml(lastmod));
    let _ = writeln!(xml, "    <changefreq>{}</changefreq>", changefreq.as_str());
    let _ = writeln!(xml, "    <priority>{:.1}</priority>", priority);

    if options.include_images {
        for image in &entry.images {
            xml.push_str("    <image:image>\n");
            let _ = writeln!(xml, "      <image:loc>{}</image:loc>", escape_xml(&image.url));
            if let Some(caption) = &image.caption {
                let _ = writeln!(xml, "      <image:caption>{}</image:caption>", escape_xml(caption));
            }
            if let Some(title) = &image.title {
                let _ = writeln!(xml, "      <image:title>{}</image:title>", escape_xml(title));
            }
            xml.push_str("    </image:image>\n");
        }
    }

    if options.include_videos {
        for video in &entry.videos {
            xml.push_str("    <video:video>\n");
            let _ = writeln!(
                xml,
                "      <video:thumbnail_loc>{}</video:thumbnail_loc>",
                escape_xml(&video.thumbnail)
            );
            let _ = writeln!(xml, "      <video:title>{}</video:title>", escape_xml(&video.title));
            let _ = writeln!(
                xml,
                "      <video:description>{}</video:description>",
                escape_xml(&video.description)
            );
            if let Some(loc) = &video.content_loc {
                let _ = writeln!(xml, "      <video:content_loc>{}</video:content_loc>", escape_xml(loc));
            }
            if let Some(loc) = &video.player_loc {
                let _ = writeln!(xml, "      <video:player_loc>{}</video:player_loc>", escape_xml(loc));
            }
            if let Some(duration) = video.duration {
                let _ = writeln!(xml, "      <video:duration>{}</video:duration>", duration);
            }
            if let Some(date) = &video.publication_date {
                let _ = writeln!(
                    xml,
                    "      <video:publication_date>{}</video:publication_date>",
                    escape_xml(date)
                );
            }
            xml.push_str("    </video:video>\n");
        }
    }

    xml.push_str("  </url>\n");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

pub fn index(sitemaps: &[SitemapRef]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = writeln!(xml, "<sitemapindex xmlns=\"{}\">", NS_SITEMAP);
    for sitemap in sitemaps {
        xml.push_str("  <sitemap>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&sitemap.url));
        if let Some(lastmod) = &sitemap.lastmod {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", escape_xml(lastmod));
        }
        xml.push_str("  </sitemap>\n");
    }
    xml.push_str("</sitemapindex>");
    xml
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapFile {
    pub filename: String,
    pub content: String,
    pub url_count: usize,
}

pub fn split(entries: &[SitemapEntry], options: SitemapOptions) -> Vec<SitemapFile> {
    split_with_limit(entries, options, MAX_URLS_PER_SITEMAP)
}

pub fn split_with_limit(entries: &[SitemapEntry], options: SitemapOptions, limit: usize) -> Vec<SitemapFile> {
    entries
        .chunks(limit.max(1))
        .enumerate()
        .map(|(i, chunk)| SitemapFile {
            filename: format!("sitemap-{}.xml", i + 1),
            content: generate(chunk, options),
            url_count: chunk.len(),
        })
        .collect()
}

/// Marketing site layout: core pages plus one page per greeting category
pub fn video_greeting_sitemap(base_url: &str) -> String {
    generate(&video_greeting_entries(base_url), SitemapOptions::default())
}

pub fn video_greeting_entries(base_url: &str) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');
    let mut entries = vec![
        SitemapEntry::with(base, 1.0, ChangeFreq::Daily),
        SitemapEntry::with(format!("{}/categories", base), 0.9, ChangeFreq::Weekly),
        SitemapEntry::with(format!("{}/creators", base), 0.9, ChangeFreq::Daily),
        SitemapEntry::with(format!("{}/how-it-works", base), 0.8, ChangeFreq::Monthly),
        SitemapEntry::with(format!("{}/pricing", base), 0.8, ChangeFreq::Weekly),
        SitemapEntry::with(format!("{}/about", base), 0.6, ChangeFreq::Monthly),
        SitemapEntry::with(format!("{}/contact", base), 0.6, ChangeFreq::Monthly),
        SitemapEntry::with(format!("{}/privacy", base), 0.3, ChangeFreq::Yearly),
        SitemapEntry::with(format!("{}/terms", base), 0.3, ChangeFreq::Yearly),
    ];
    for category in [
        "birthday",
        "anniversary",
        "wedding",
        "graduation",
        "holiday",
        "congratulations",
        "thank-you",
        "apology",
    ] {
        entries.push(SitemapEntry::with(
            format!("{}/category/{}", base, category),
            0.7,
            ChangeFreq::Weekly,
        ));
    }
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub url_count: usize,
}

pub fn validate(xml: &str) -> SitemapValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !xml.contains("<?xml version=\"1.0\"") {
        errors.push("Missing XML declaration".to_string());
    }
    if !xml.contains("<urlset") {
        errors.push("Missing urlset root element".to_string());
    }

    let url_count = xml.matches("<url>").count();
    if url_count > MAX_URLS_PER_SITEMAP {
        warnings.push(format!(
            "URL count ({}) exceeds the recommended maximum ({})",
            url_count, MAX_URLS_PER_SITEMAP
        ));
    }

    for (i, block) in URL_BLOCK.find_iter(xml).enumerate() {
        if !block.as_str().contains("<loc>") {
            errors.push(format!("URL {}: missing loc element", i + 1));
        }
    }

    SitemapValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        url_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Homepage,
    Category,
    Product,
    Blog,
    Static,
    Other,
}

pub fn suggest_priority(kind: PageKind) -> f32 {
    match kind {
        PageKind::Homepage => 1.0,
        PageKind::Category => 0.8,
        PageKind::Product => 0.6,
        PageKind::Blog => 0.5,
        PageKind::Static => 0.4,
        PageKind::Other => DEFAULT_PRIORITY,
    }
}

pub fn suggest_changefreq(kind: PageKind) -> ChangeFreq {
    match kind {
        PageKind::Homepage => ChangeFreq::Daily,
        PageKind::Category | PageKind::Product => ChangeFreq::Weekly,
        PageKind::Blog => ChangeFreq::Monthly,
        PageKind::Static => ChangeFreq::Yearly,
        PageKind::Other => ChangeFreq::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let xml = generate_on(&[SitemapEntry::new("https://example.com/a?x=1&y=2")], SitemapOptions::default(), day());

        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<loc>https://example.com/a?x=1&amp;y=2</loc>"));
        assert!(xml.contains("<lastmod>2026-03-14</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(!xml.contains("xmlns:image"));
    }

    #[test]
    fn test_media_extensions() {
        let mut entry = SitemapEntry::new("https://example.com/v");
        entry.images.push(SitemapImage {
            url: "https://example.com/i.webp".to_string(),
            caption: Some("Birthday <surprise>".to_string()),
            title: None,
        });
        entry.videos.push(SitemapVideo {
            thumbnail: "https://example.com/t.jpg".to_string(),
            title: "Dance".to_string(),
            description: "A dance greeting".to_string(),
            duration: Some(45),
            ..Default::default()
        });

        let without = generate_on(&[entry.clone()], SitemapOptions::default(), day());
        assert!(!without.contains("<image:image>"));

        let xml = generate_on(
            &[entry],
            SitemapOptions {
                include_images: true,
                include_videos: true,
            },
            day(),
        );
        assert!(xml.contains("xmlns:image=") && xml.contains("xmlns:video="));
        assert!(xml.contains("<image:caption>Birthday &lt;surprise&gt;</image:caption>"));
        assert!(xml.contains("<video:duration>45</video:duration>"));
        assert!(!xml.contains("<video:player_loc>"));
    }

    #[test]
    fn test_site_template_validates() {
        let xml = video_greeting_sitemap("https://wishesvideo.com/");
        let result = validate(&xml);

        assert!(result.is_valid);
        assert_eq!(result.url_count, 17);
        assert!(xml.contains("<loc>https://wishesvideo.com/category/thank-you</loc>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn test_validate_errors() {
        let result = validate("<urlset><url><lastmod>x</lastmod></url></urlset>");
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                "Missing XML declaration".to_string(),
                "URL 1: missing loc element".to_string()
            ]
        );
    }

    #[test]
    fn test_split_and_index() {
        let entries: Vec<SitemapEntry> = (0..5)
            .map(|i| SitemapEntry::new(format!("https://example.com/{}", i)))
            .collect();
        let files = split_with_limit(&entries, SitemapOptions::default(), 2);

        assert_eq!(files.len(), 3);
        assert_eq!(files[2].filename, "sitemap-3.xml");
        assert_eq!(files[2].url_count, 1);

        let idx = index(&[SitemapRef {
            url: "https://example.com/sitemap-1.xml".to_string(),
            lastmod: None,
        }]);
        assert!(idx.contains("<sitemapindex"));
        assert!(!idx.contains("<lastmod>"));
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(suggest_priority(PageKind::Homepage), 1.0);
        assert_eq!(suggest_changefreq(PageKind::Static), ChangeFreq::Yearly);
        assert_eq!(suggest_priority(PageKind::Other), 0.5);
    }
}
