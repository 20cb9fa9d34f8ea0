// * Image SEO: per-image checks, alt text and filename suggestions

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

use super::structured_data::{self, ImageInput};

const SUPPORTED_FORMATS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "svg", "avif"];
const MODERN_FORMATS: [&str; 2] = ["webp", "avif"];
const MAX_FILE_SIZE: u64 = 1024 * 1024;
const ALT_MIN_CHARS: usize = 5;
const ALT_MAX_CHARS: usize = 125;
const MAX_ALT_SUGGESTIONS: usize = 5;

// * Camera and CMS default names
static MEANINGLESS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:img|image|photo|pic|screenshot|dsc)[-_]?\d+|untitled.*|\d+)$").unwrap()
});
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-_.]+").unwrap());
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    /// Bytes
    pub file_size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub structured_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSeoAnalysis {
    pub score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub optimizations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Logo,
    Product,
    Person,
    Screenshot,
    Icon,
    Banner,
    General,
}

/// Last path segment without query or fragment
fn file_name(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

fn split_ext(name: &str) -> (&str, String) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext.to_lowercase()),
        _ => (name, String::new()),
    }
}

pub fn is_descriptive_filename(stem: &str) -> bool {
    stem.chars().count() > 3 && !MEANINGLESS_NAME.is_match(stem)
}

pub fn detect_kind(path: &str) -> ImageKind {
    let name = file_name(path).to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));
    if has(&["logo"]) {
        ImageKind::Logo
    } else if has(&["product", "item"]) {
        ImageKind::Product
    } else if has(&["person", "avatar", "profile"]) {
        ImageKind::Person
    } else if has(&["screenshot", "screen"]) {
        ImageKind::Screenshot
    } else if has(&["icon"]) {
        ImageKind::Icon
    } else if has(&["banner", "hero"]) {
        ImageKind::Banner
    } else {
        ImageKind::General
    }
}

pub fn analyze_image(path: &str, alt: Option<&str>, metadata: &ImageMetadata) -> ImageSeoAnalysis {
    let mut analysis = ImageSeoAnalysis::default();
    let mut score = 0u32;
    let (stem, ext) = split_ext(file_name(path));

    if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        score += 10;
    } else {
        analysis.issues.push(format!("Unsupported image format: {}", ext));
    }

    let alt_len = alt.map(|a| a.trim().chars().count()).unwrap_or(0);
    if alt_len == 0 {
        analysis.issues.push("Missing alt text".to_string());
    } else if alt_len < ALT_MIN_CHARS {
        analysis.issues.push("Alt text is too short".to_string());
    } else if alt_len > ALT_MAX_CHARS {
        analysis
            .issues
            .push(format!("Alt text is too long (keep it under {} characters)", ALT_MAX_CHARS));
    } else {
        score += 25;
    }

    if is_descriptive_filename(stem) {
        score += 15;
    } else {
        analysis.recommendations.push("Use a descriptive file name".to_string());
    }

    if let Some(size) = metadata.file_size {
        if size > MAX_FILE_SIZE {
            analysis
                .issues
                .push("File is too large and slows down page load".to_string());
        } else {
            score += 15;
        }
    }

    if let (Some(w), Some(h)) = (metadata.width, metadata.height) {
        let ratio = if h == 0 { 0.0 } else { w as f64 / h as f64 };
        if (0.5..=3.0).contains(&ratio) {
            score += 10;
        } else {
            analysis
                .recommendations
                .push("Consider adjusting the aspect ratio".to_string());
        }
    }

    if MODERN_FORMATS.contains(&ext.as_str()) {
        score += 15;
    } else {
        analysis
            .optimizations
            .push("Convert to WebP for better performance".to_string());
    }

    if metadata.structured_data {
        score += 10;
    } else {
        analysis
            .recommendations
            .push("Add ImageObject structured data".to_string());
    }

    analysis.score = score.min(100) as u8;
    analysis
}

pub fn alt_suggestions(path: &str, context: Option<&str>, keywords: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();
    let (stem, _) = split_ext(file_name(path));

    let cleaned = DIGITS.replace_all(&stem.replace(['-', '_'], " "), "").to_string();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if !cleaned.is_empty() {
        suggestions.push(cleaned);
    }

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        suggestions.push(context.to_string());
        if let Some(primary) = keywords.first() {
            suggestions.push(format!("{} - {}", context, primary));
            suggestions.push(format!("{} {}", primary, context));
        }
    }

    let generic: &[&str] = match detect_kind(path) {
        ImageKind::Logo => &["Company logo", "Brand logo"],
        ImageKind::Product => &["Product photo", "Product close-up"],
        ImageKind::Person => &["Portrait photo", "Team member"],
        ImageKind::Screenshot => &["Screenshot", "Feature walkthrough"],
        _ => &["Illustrative image"],
    };
    suggestions.extend(generic.iter().map(|s| s.to_string()));

    let mut seen = HashSet::new();
    suggestions.retain(|s| seen.insert(s.clone()));
    suggestions.truncate(MAX_ALT_SUGGESTIONS);
    suggestions
}

fn slug(text: &str) -> String {
    text.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

pub fn optimize_filename(original: &str, keywords: &[String], context: Option<&str>) -> String {
    let lowered = original.to_lowercase();
    let replaced = NON_SLUG.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&replaced, "-");
    let mut name = collapsed.trim_matches('-').replace("-.", ".");

    let (stem, _) = split_ext(&name);
    if !is_descriptive_filename(stem) {
        if let Some(keyword) = keywords.first() {
            name = format!("{}-{}", slug(keyword), name);
        }
    }

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        let context_slug = slug(context);
        if !name.contains(&context_slug) {
            name = format!("{}-{}", context_slug, name);
        }
    }

    name
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiveImage {
    pub srcset: String,
    pub sizes: String,
    pub src: String,
    pub loading: String,
    pub decoding: String,
}

pub fn responsive_config(base_url: &str, filename: &str) -> ResponsiveImage {
    let base = base_url.trim_end_matches('/');
    let (stem, ext) = split_ext(filename);
    let dot_ext = if ext.is_empty() { String::new() } else { format!(".{}", ext) };
    let srcset = [300, 600, 900, 1200]
        .iter()
        .map(|w| format!("{}/{}-{}w{} {}w", base, stem, w, dot_ext, w))
        .collect::<Vec<_>>()
        .join(", ");
    ResponsiveImage {
        srcset,
        sizes: "(max-width: 300px) 300px, (max-width: 600px) 600px, (max-width: 900px) 900px, 1200px"
            .to_string(),
        src: format!("{}/{}-600w{}", base, stem, dot_ext),
        loading: "lazy".to_string(),
        decoding: "async".to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoThumbnail {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: String,
    /// Seconds
    pub duration: u32,
}

/// Alt text, file names and JSON-LD for a greeting video's thumbnail and poster
pub fn video_greeting_images(video: &VideoThumbnail) -> Value {
    let poster_url = video.thumbnail_url.replace("thumbnail", "poster");
    let mut thumbnail = structured_data::image(&ImageInput {
        url: video.thumbnail_url.clone(),
        caption: Some(format!("{} video thumbnail", video.title)),
        description: video.description.clone(),
        ..Default::default()
    });
    thumbnail["representativeOfPage"] = json!(true);

    let mut poster = structured_data::image(&ImageInput {
        url: poster_url,
        caption: Some(format!("{} video poster", video.title)),
        description: Some(format!("{}-second personalized video greeting", video.duration)),
        ..Default::default()
    });
    poster["associatedMedia"] = json!({
        "@type": "VideoObject",
        "name": video.title,
        "description": video.description,
        "duration": format!("PT{}S", video.duration),
    });

    json!({
        "thumbnail": {
            "alt": format!("{} - personalized video greeting thumbnail", video.title),
            "filename": format!("video-greeting-{}-thumbnail.webp", video.video_id),
            "structuredData": thumbnail,
        },
        "poster": {
            "alt": format!("{} - video poster", video.title),
            "filename": format!("video-greeting-{}-poster.webp", video.video_id),
            "structuredData": poster,
        },
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistCategory {
    pub category: String,
    pub items: Vec<String>,
}

pub fn checklist() -> Vec<ChecklistCategory> {
    let category = |name: &str, items: &[&str]| ChecklistCategory {
        category: name.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        category(
            "Basics",
            &[
                "Use descriptive file names",
                "Write meaningful alt text",
                "Keep files under 1 MB",
                "Pick the right format",
            ],
        ),
        category(
            "Technical",
            &[
                "Serve modern formats (WebP/AVIF)",
                "Provide responsive srcset variants",
                "Lazy-load below-the-fold images",
                "Declare width and height",
            ],
        ),
        category(
            "Structured data",
            &[
                "Add ImageObject markup",
                "Set captions and descriptions",
                "Declare licensing information",
                "Link images to related content",
            ],
        ),
        category(
            "User experience",
            &[
                "Caption images where helpful",
                "Keep images relevant to the content",
                "Optimize loading performance",
                "Provide fallback text",
            ],
        ),
    ]
}

/// One image in a batch request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRequest {
    pub path: String,
    pub url: Option<String>,
    pub alt: Option<String>,
    pub context: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptimizations {
    pub original_alt: Option<String>,
    pub suggested_alt: Vec<String>,
    pub optimized_filename: String,
    pub structured_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedImage {
    pub index: usize,
    pub path: String,
    pub analysis: ImageSeoAnalysis,
    pub optimizations: ImageOptimizations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImage {
    pub index: usize,
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub avg_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBatchResult {
    pub optimized: Vec<OptimizedImage>,
    pub failed: Vec<FailedImage>,
    pub summary: ImageBatchSummary,
}

pub fn batch_optimize(images: &[ImageRequest]) -> ImageBatchResult {
    let mut optimized = Vec::new();
    let mut failed = Vec::new();

    for (index, image) in images.iter().enumerate() {
        if image.path.trim().is_empty() {
            failed.push(FailedImage {
                index,
                path: image.path.clone(),
                error: "image path is empty".to_string(),
            });
            continue;
        }

        let analysis = analyze_image(&image.path, image.alt.as_deref(), &image.metadata);
        let optimizations = ImageOptimizations {
            original_alt: image.alt.clone(),
            suggested_alt: alt_suggestions(&image.path, image.context.as_deref(), &image.keywords),
            optimized_filename: optimize_filename(
                file_name(&image.path),
                &image.keywords,
                image.context.as_deref(),
            ),
            structured_data: structured_data::image(&ImageInput {
                url: image.url.clone().unwrap_or_else(|| image.path.clone()),
                caption: image.caption.clone(),
                description: image.description.clone(),
                width: image.metadata.width,
                height: image.metadata.height,
                ..Default::default()
            }),
        };
        optimized.push(OptimizedImage {
            index,
            path: image.path.clone(),
            analysis,
            optimizations,
        });
    }

    let success = optimized.len();
    let total_score: u32 = optimized.iter().map(|o| o.analysis.score as u32).sum();
    let avg_score = if success == 0 {
        0
    } else {
        (total_score as f64 / success as f64).round() as u8
    };

    ImageBatchResult {
        summary: ImageBatchSummary {
            total: images.len(),
            success,
            failed: failed.len(),
            avg_score,
        },
        optimized,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_image() {
        let analysis = analyze_image(
            "https://cdn.x.com/birthday-dance-greeting.webp?v=2",
            Some("Dancers performing a birthday greeting"),
            &ImageMetadata {
                file_size: Some(200_000),
                width: Some(1200),
                height: Some(630),
                structured_data: true,
            },
        );
        assert_eq!(analysis.score, 100);
        assert!(analysis.issues.is_empty());
        assert!(analysis.optimizations.is_empty());
    }

    #[test]
    fn test_poor_image() {
        let analysis = analyze_image(
            "/uploads/IMG_1234.bmp",
            None,
            &ImageMetadata {
                file_size: Some(3 * 1024 * 1024),
                width: Some(4000),
                height: Some(500),
                structured_data: false,
            },
        );
        assert_eq!(analysis.score, 0);
        assert_eq!(analysis.issues.len(), 3);
        assert_eq!(analysis.recommendations.len(), 3);
    }

    #[test]
    fn test_descriptive_names() {
        assert!(!is_descriptive_filename("img001"));
        assert!(!is_descriptive_filename("DSC_0042"));
        assert!(!is_descriptive_filename("untitled-3"));
        assert!(!is_descriptive_filename("12345"));
        assert!(!is_descriptive_filename("cat"));
        assert!(is_descriptive_filename("wedding-toast"));
    }

    #[test]
    fn test_optimize_filename() {
        assert_eq!(
            optimize_filename("IMG 0042 (Final).JPG", &["birthday video".to_string()], None),
            "img-0042-final.jpg"
        );
        assert_eq!(
            optimize_filename("IMG0042.jpg", &["birthday video".to_string()], Some("Dance")),
            "dance-birthday-video-img0042.jpg"
        );
    }

    #[test]
    fn test_alt_suggestions() {
        let suggestions = alt_suggestions(
            "/img/product_dance-2024.png",
            Some("Zambian dance crew"),
            &["birthday video".to_string()],
        );
        assert_eq!(suggestions[0], "product dance");
        assert_eq!(suggestions[2], "Zambian dance crew - birthday video");
        assert_eq!(suggestions.len(), 5);
    }

    #[test]
    fn test_batch() {
        let result = batch_optimize(&[
            ImageRequest {
                path: "hero-banner.webp".to_string(),
                alt: Some("Greeting video hero".to_string()),
                ..Default::default()
            },
            ImageRequest::default(),
        ]);
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.success, 1);
        assert_eq!(result.failed[0].index, 1);
        // * format 10 + alt 25 + name 15 + modern 15
        assert_eq!(result.summary.avg_score, 65);
        assert_eq!(
            result.optimized[0].optimizations.structured_data["contentUrl"],
            "hero-banner.webp"
        );
    }

    #[test]
    fn test_responsive_and_video() {
        let config = responsive_config("https://cdn.x.com/", "hero.webp");
        assert_eq!(config.src, "https://cdn.x.com/hero-600w.webp");
        assert!(config.srcset.ends_with("hero-1200w.webp 1200w"));

        let seo = video_greeting_images(&VideoThumbnail {
            video_id: "42".to_string(),
            title: "Birthday Dance".to_string(),
            description: None,
            thumbnail_url: "https://cdn.x.com/42/thumbnail.jpg".to_string(),
            duration: 45,
        });
        assert_eq!(seo["poster"]["filename"], "video-greeting-42-poster.webp");
        assert_eq!(seo["poster"]["structuredData"]["contentUrl"], "https://cdn.x.com/42/poster.jpg");
        assert_eq!(seo["poster"]["structuredData"]["associatedMedia"]["duration"], "PT45S");
        assert_eq!(checklist().len(), 4);
    }
}
