// * Competitor keyword intelligence
// * Hand-curated profiles of the direct competitors and the market around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPositioning {
    pub main_message: String,
    pub value_propositions: Vec<String>,
    pub target_audience: String,
    pub emotional_triggers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorProfile {
    pub name: String,
    pub url: String,
    pub primary_keywords: Vec<String>,
    pub long_tail_keywords: Vec<String>,
    pub positioning: BrandPositioning,
    pub tone: String,
    pub content_themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketKeywords {
    pub high_volume: Vec<String>,
    pub emerging: Vec<String>,
    pub niche_opportunities: Vec<String>,
    pub seasonal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitiveGaps {
    pub underserved_keywords: Vec<String>,
    pub content_opportunities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordTargets {
    pub primary_keyword_targets: Vec<String>,
    pub blog_topics: Vec<String>,
    pub landing_pages: Vec<String>,
    pub differentiation_keywords: Vec<String>,
}

/// Everything the keyword strategy is built from; persisted as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordReport {
    pub generated_at: DateTime<Utc>,
    pub competitors: Vec<CompetitorProfile>,
    pub market: MarketKeywords,
    pub gaps: CompetitiveGaps,
    pub recommendations: KeywordTargets,
}

/// A competitor keyword and who uses it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordOverlap {
    pub keyword: String,
    pub competitors: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn competitor_profiles() -> Vec<CompetitorProfile> {
    vec![
        CompetitorProfile {
            name: "VidBlessings".to_string(),
            url: "https://vidblessings.com/".to_string(),
            primary_keywords: owned(&[
                "personalized video greetings",
                "funny gift videos",
                "authentic video messages",
                "custom greeting videos",
                "video gifts from real people",
            ]),
            long_tail_keywords: owned(&[
                "funniest gift on the planet",
                "personalized video messages from africa",
                "authentic greeting videos real people",
                "custom video greetings birthday",
                "funny personalized video gifts",
            ]),
            positioning: BrandPositioning {
                main_message: "The Funniest Gift on the Planet".to_string(),
                value_propositions: owned(&[
                    "100% real people (authenticity)",
                    "Fair pay for creators",
                    "Community support",
                    "Authenticity guaranteed",
                ]),
                target_audience: "People seeking authentic, funny, memorable gifts".to_string(),
                emotional_triggers: owned(&["humor", "authenticity", "uniqueness", "social impact"]),
            },
            tone: "Fun, authentic, community-focused".to_string(),
            content_themes: owned(&["personalization", "community", "authenticity"]),
        },
        CompetitorProfile {
            name: "Wishes Made Visual".to_string(),
            url: "https://wishesmadevisual.com/".to_string(),
            primary_keywords: owned(&[
                "personalized greeting video from africa",
                "custom video wishes",
                "tiktok greeting videos",
                "african greeting videos",
                "personalized video messages",
            ]),
            long_tail_keywords: owned(&[
                "number 1 greeting videos on tiktok",
                "personalized greeting video from africa zambia",
                "custom video wishes fast delivery",
                "african children greeting videos",
                "personalized video messages 1-3 days",
            ]),
            positioning: BrandPositioning {
                main_message: "#1 Greeting Videos on TikTok".to_string(),
                value_propositions: owned(&[
                    "Fast delivery (1-3 days)",
                    "100% customizable",
                    "TikTok viral content",
                    "Social impact (meal donations)",
                ]),
                target_audience: "Social media savvy users, TikTok audience".to_string(),
                emotional_triggers: owned(&["speed", "viral content", "social impact", "customization"]),
            },
            tone: "Trendy, fast-paced, socially conscious".to_string(),
            content_themes: owned(&["tiktok", "speed", "customization", "social impact"]),
        },
        CompetitorProfile {
            name: "Dance Greetings Africa".to_string(),
            url: "https://www.dancegreetingsafrica.com/".to_string(),
            primary_keywords: owned(&[
                "african dance greetings",
                "dance greeting videos",
                "african cultural videos",
                "traditional dance greetings",
                "cultural greeting videos",
            ]),
            long_tail_keywords: owned(&[
                "authentic african dance greeting videos",
                "traditional african dance messages",
                "cultural dance video greetings",
                "african heritage greeting videos",
                "traditional dance personalized videos",
            ]),
            positioning: BrandPositioning {
                main_message: "Authentic African Cultural Greetings".to_string(),
                value_propositions: owned(&[
                    "Cultural authenticity",
                    "Traditional dance focus",
                    "African heritage celebration",
                    "Unique cultural experience",
                ]),
                target_audience: "People interested in African culture, cultural enthusiasts"
                    .to_string(),
                emotional_triggers: owned(&["cultural pride", "authenticity", "heritage", "tradition"]),
            },
            tone: "Cultural, respectful, authentic".to_string(),
            content_themes: owned(&["culture", "dance", "tradition", "africa"]),
        },
    ]
}

pub fn market_keywords() -> MarketKeywords {
    MarketKeywords {
        high_volume: owned(&[
            "personalized video",
            "custom greeting video",
            "video message",
            "personalized gift",
            "greeting video",
        ]),
        emerging: owned(&[
            "tiktok greeting video",
            "viral video message",
            "ai personalized video",
            "same day video delivery",
            "corporate greeting video",
        ]),
        niche_opportunities: owned(&[
            "african greeting video",
            "cultural video message",
            "dance greeting video",
            "authentic video greeting",
            "ethical video gifts",
        ]),
        seasonal: owned(&[
            "birthday greeting video",
            "christmas video message",
            "wedding greeting video",
            "graduation video message",
            "anniversary video greeting",
        ]),
    }
}

pub fn competitive_gaps() -> CompetitiveGaps {
    CompetitiveGaps {
        underserved_keywords: owned(&[
            "corporate video greetings",
            "business personalized videos",
            "ai-powered video messages",
            "same-day video delivery",
            "video greeting subscriptions",
            "multilingual greeting videos",
            "celebrity-style video messages",
            "professional video greetings",
        ]),
        content_opportunities: owned(&[
            "How-to guides for video greetings",
            "Cultural significance of video messages",
            "Business use cases for personalized videos",
            "Technology behind video personalization",
            "ROI of personalized video marketing",
        ]),
    }
}

pub fn keyword_targets() -> KeywordTargets {
    KeywordTargets {
        primary_keyword_targets: owned(&[
            "personalized video messages",
            "custom greeting videos",
            "professional video greetings",
            "ai personalized videos",
            "same day video delivery",
        ]),
        blog_topics: owned(&[
            "The Psychology of Personalized Video Messages",
            "How to Create the Perfect Video Greeting",
            "Business Applications of Custom Video Messages",
            "Cultural Sensitivity in Video Greetings",
            "Technology Trends in Video Personalization",
        ]),
        landing_pages: owned(&[
            "Corporate Video Greetings",
            "Birthday Video Messages",
            "Wedding Video Greetings",
            "Holiday Video Messages",
            "Professional Video Announcements",
        ]),
        differentiation_keywords: owned(&[
            "ai-powered video personalization",
            "professional video greetings",
            "corporate video messages",
            "multilingual video greetings",
            "technology-enhanced video gifts",
        ]),
    }
}

pub fn keyword_report() -> KeywordReport {
    KeywordReport {
        generated_at: Utc::now(),
        competitors: competitor_profiles(),
        market: market_keywords(),
        gaps: competitive_gaps(),
        recommendations: keyword_targets(),
    }
}

/// Which of `keywords` competitors already target (primary or long-tail, case-insensitive)
pub fn keyword_overlap(profiles: &[CompetitorProfile], keywords: &[String]) -> Vec<KeywordOverlap> {
    keywords
        .iter()
        .map(|keyword| {
            let needle = keyword.to_lowercase();
            let competitors = profiles
                .iter()
                .filter(|p| {
                    p.primary_keywords
                        .iter()
                        .chain(p.long_tail_keywords.iter())
                        .any(|k| k.to_lowercase() == needle)
                })
                .map(|p| p.name.clone())
                .collect();
            KeywordOverlap {
                keyword: keyword.clone(),
                competitors,
            }
        })
        .collect()
}
