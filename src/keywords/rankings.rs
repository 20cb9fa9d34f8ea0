// * Keyword ranking monitor
// * Positions come from a pluggable RankingSource. Without a real provider
// * the state is recorded as unavailable; positions are never invented.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::ops::alerting::{Alert, AlertKind, AlertSeverity};

// * Beyond page three
const LOW_RANKING_POSITION: u32 = 30;
// * Positions lost since the previous check
const RANKING_DROP_THRESHOLD: i64 = 5;
// * Positions counted as healthy
const HEALTHY_POSITION: u32 = 20;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("ranking data unavailable: {0}")]
    Unavailable(String),

    #[error("ranking provider error: {0}")]
    Provider(String),
}

pub type RankingResult<T> = Pin<Box<dyn Future<Output = Result<T, RankingError>> + Send>>;

/// Search position provider. `Ok(None)` means the keyword is not ranked at all.
pub trait RankingSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn position(&self, keyword: &str, domain: &str) -> RankingResult<Option<u32>>;
}

/// Default source when no SERP provider is configured
#[derive(Debug, Default, Clone)]
pub struct UnavailableRankings;

impl RankingSource for UnavailableRankings {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn position(&self, _keyword: &str, _domain: &str) -> RankingResult<Option<u32>> {
        Box::pin(async { Err(RankingError::Unavailable("no ranking provider configured".to_string())) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStatus {
    Ranked,
    NotRanked,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingSnapshot {
    pub keyword: String,
    pub status: RankingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Positive when the keyword climbed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<i64>,
    pub checked_at: DateTime<Utc>,
    pub trend: Trend,
}

impl RankingSnapshot {
    pub fn unavailable(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            status: RankingStatus::Unavailable,
            position: None,
            change: None,
            checked_at: Utc::now(),
            trend: Trend::Unknown,
        }
    }

    /// Builds a snapshot from a provider answer, diffing against the previous one
    pub fn observed(keyword: impl Into<String>, position: Option<u32>, previous: Option<&RankingSnapshot>) -> Self {
        let change = match (previous.and_then(|p| p.position), position) {
            (Some(before), Some(now)) => Some(before as i64 - now as i64),
            _ => None,
        };
        let trend = match change {
            Some(c) if c > 0 => Trend::Up,
            Some(c) if c < 0 => Trend::Down,
            Some(_) => Trend::Stable,
            None => Trend::Unknown,
        };
        Self {
            keyword: keyword.into(),
            status: if position.is_some() {
                RankingStatus::Ranked
            } else {
                RankingStatus::NotRanked
            },
            position,
            change,
            checked_at: Utc::now(),
            trend,
        }
    }
}

/// Checks every keyword concurrently. Provider errors become `unavailable` snapshots.
pub async fn check_rankings(
    source: &dyn RankingSource,
    domain: &str,
    keywords: &[String],
    previous: &HashMap<String, RankingSnapshot>,
) -> Vec<RankingSnapshot> {
    let lookups = keywords.iter().map(|k| source.position(k, domain));
    let results = join_all(lookups).await;

    keywords
        .iter()
        .zip(results)
        .map(|(keyword, result)| match result {
            Ok(position) => RankingSnapshot::observed(keyword.clone(), position, previous.get(keyword)),
            Err(e) => {
                tracing::debug!(keyword = %keyword, source = source.name(), error = %e, "Ranking lookup failed");
                RankingSnapshot::unavailable(keyword.clone())
            }
        })
        .collect()
}

/// Alerts for real positions only
pub fn ranking_alerts(snapshots: &[RankingSnapshot]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for snapshot in snapshots {
        let Some(position) = snapshot.position else {
            continue;
        };
        if position > LOW_RANKING_POSITION {
            alerts.push(
                Alert::new(
                    AlertSeverity::Medium,
                    AlertKind::RankingLow,
                    format!("ranking:{}", snapshot.keyword),
                    position as f64,
                    format!("Keyword \"{}\" is ranking low (position {})", snapshot.keyword, position),
                )
                .with_threshold(LOW_RANKING_POSITION as f64),
            );
        }
        if let Some(change) = snapshot.change {
            if change < -RANKING_DROP_THRESHOLD {
                alerts.push(
                    Alert::new(
                        AlertSeverity::Medium,
                        AlertKind::RankingDrop,
                        format!("ranking:{}", snapshot.keyword),
                        change as f64,
                        format!(
                            "Keyword \"{}\" dropped {} positions",
                            snapshot.keyword,
                            change.abs()
                        ),
                    )
                    .with_threshold(-RANKING_DROP_THRESHOLD as f64),
                );
            }
        }
    }
    alerts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordHealth {
    Good,
    NeedsImprovement,
    Unknown,
}

/// Good when more than half of the ranked keywords sit in the top 20
pub fn keyword_health(snapshots: &[RankingSnapshot]) -> KeywordHealth {
    let positions: Vec<u32> = snapshots.iter().filter_map(|s| s.position).collect();
    if positions.is_empty() {
        return KeywordHealth::Unknown;
    }
    let healthy = positions.iter().filter(|p| **p <= HEALTHY_POSITION).count();
    if healthy * 2 > positions.len() {
        KeywordHealth::Good
    } else {
        KeywordHealth::NeedsImprovement
    }
}
