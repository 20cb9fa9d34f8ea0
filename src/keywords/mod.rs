// * Keywords: competitor intelligence, on-page density and ranking monitoring

pub mod competitors;
pub mod density;
pub mod rankings;

pub use competitors::{keyword_overlap, keyword_report, CompetitorProfile, KeywordReport};
pub use density::{analyze_keywords, KeywordAnalysis, KeywordDensity};
pub use rankings::{
    check_rankings, keyword_health, ranking_alerts, KeywordHealth, RankingError, RankingSnapshot,
    RankingSource, RankingStatus, Trend, UnavailableRankings,
};
