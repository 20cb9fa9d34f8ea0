// * In-memory monitoring state: analysis history, alerts, keyword rankings
// * Bounded; oldest entries are evicted first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::config::constants::{ALERT_CAPACITY, HISTORY_CAPACITY};
use crate::engine::scorer::PageAnalysis;
use crate::keywords::rankings::{keyword_health, KeywordHealth, RankingSnapshot};
use crate::ops::alerting::Alert;
use crate::ops::telemetry;

// * Window sizes used by the summary report
const QUALITY_WINDOW: usize = 10;
const REPORT_RECENT_ANALYSES: usize = 5;
const REPORT_RECENT_ALERTS: usize = 10;

const QUALITY_GOOD_ABOVE: f64 = 70.0;
const QUALITY_WARNING_ABOVE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Good,
    Warning,
    Poor,
    /// Nothing analysed yet
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuality {
    pub status: QualityStatus,
    pub average_score: f64,
    pub sample_size: usize,
}

impl ContentQuality {
    /// Grades the mean score of `scores`
    pub fn from_scores(scores: &[u8]) -> Self {
        if scores.is_empty() {
            return Self {
                status: QualityStatus::Unknown,
                average_score: 0.0,
                sample_size: 0,
            };
        }
        let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
        let average = f64::from(sum) / scores.len() as f64;
        let status = if average > QUALITY_GOOD_ABOVE {
            QualityStatus::Good
        } else if average > QUALITY_WARNING_ABOVE {
            QualityStatus::Warning
        } else {
            QualityStatus::Poor
        };
        Self {
            status,
            average_score: (average * 10.0).round() / 10.0,
            sample_size: scores.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_analyses: usize,
    pub average_score: f64,
    pub keyword_rankings: usize,
    pub active_alerts: usize,
}

/// Summary report served by the API and saved by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub recent_analyses: Vec<PageAnalysis>,
    pub keyword_performance: BTreeMap<String, RankingSnapshot>,
    pub alerts: Vec<Alert>,
    pub content_quality: ContentQuality,
    pub keyword_health: KeywordHealth,
}

#[derive(Debug, Default)]
struct RankingBook {
    snapshots: HashMap<String, RankingSnapshot>,
    updated_at: Option<DateTime<Utc>>,
}

/// Shared monitoring state. All methods take `&self`; wrap in `Arc` to share.
#[derive(Debug)]
pub struct MonitoringStore {
    analyses: RwLock<VecDeque<PageAnalysis>>,
    alerts: RwLock<VecDeque<Alert>>,
    rankings: RwLock<RankingBook>,
    capacity: usize,
    alert_capacity: usize,
}

impl Default for MonitoringStore {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// Last `limit` items, oldest first
fn tail<T: Clone>(items: &VecDeque<T>, limit: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(limit);
    items.iter().skip(skip).cloned().collect()
}

impl MonitoringStore {
    pub fn new(capacity: usize) -> Self {
        Self::with_capacities(capacity, ALERT_CAPACITY)
    }

    pub fn with_capacities(capacity: usize, alert_capacity: usize) -> Self {
        Self {
            analyses: RwLock::new(VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY))),
            alerts: RwLock::new(VecDeque::new()),
            rankings: RwLock::new(RankingBook::default()),
            capacity: capacity.max(1),
            alert_capacity: alert_capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an analysis, evicting the oldest past capacity
    pub async fn push_analysis(&self, analysis: PageAnalysis) {
        let mut analyses = self.analyses.write().await;
        analyses.push_back(analysis);
        while analyses.len() > self.capacity {
            analyses.pop_front();
        }
        telemetry::set_history_size(analyses.len());
    }

    pub async fn analysis_count(&self) -> usize {
        self.analyses.read().await.len()
    }

    /// Most recent `limit` analyses, oldest first
    pub async fn recent(&self, limit: usize) -> Vec<PageAnalysis> {
        tail(&*self.analyses.read().await, limit)
    }

    /// Latest analysis of one URL
    pub async fn latest_for(&self, url: &str) -> Option<PageAnalysis> {
        self.analyses
            .read()
            .await
            .iter()
            .rev()
            .find(|a| a.url == url)
            .cloned()
    }

    pub async fn push_alert(&self, alert: Alert) {
        let mut alerts = self.alerts.write().await;
        alerts.push_back(alert);
        while alerts.len() > self.alert_capacity {
            alerts.pop_front();
        }
    }

    pub async fn push_alerts(&self, new_alerts: Vec<Alert>) {
        for alert in new_alerts {
            self.push_alert(alert).await;
        }
    }

    pub async fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        tail(&*self.alerts.read().await, limit)
    }

    pub async fn alert_count(&self) -> usize {
        self.alerts.read().await.len()
    }

    /// Replaces the snapshots of the given keywords
    pub async fn update_rankings(&self, snapshots: Vec<RankingSnapshot>) {
        let mut book = self.rankings.write().await;
        for snapshot in snapshots {
            book.snapshots.insert(snapshot.keyword.clone(), snapshot);
        }
        book.updated_at = Some(Utc::now());
    }

    /// Current snapshots keyed by keyword
    pub async fn rankings(&self) -> HashMap<String, RankingSnapshot> {
        self.rankings.read().await.snapshots.clone()
    }

    pub async fn rankings_updated_at(&self) -> Option<DateTime<Utc>> {
        self.rankings.read().await.updated_at
    }

    /// Quality grade over the last ten analyses
    pub async fn content_quality(&self) -> ContentQuality {
        let scores: Vec<u8> = self
            .recent(QUALITY_WINDOW)
            .await
            .iter()
            .map(|a| a.score)
            .collect();
        ContentQuality::from_scores(&scores)
    }

    pub async fn report(&self) -> MonitoringReport {
        let (total_analyses, average_score, recent_analyses) = {
            let analyses = self.analyses.read().await;
            let sum: u32 = analyses.iter().map(|a| u32::from(a.score)).sum();
            let average = if analyses.is_empty() {
                0.0
            } else {
                (f64::from(sum) / analyses.len() as f64 * 10.0).round() / 10.0
            };
            (analyses.len(), average, tail(&analyses, REPORT_RECENT_ANALYSES))
        };

        let (active_alerts, alerts) = {
            let alerts = self.alerts.read().await;
            (alerts.len(), tail(&alerts, REPORT_RECENT_ALERTS))
        };

        let snapshots = self.rankings().await;
        let health = keyword_health(&snapshots.values().cloned().collect::<Vec<_>>());

        MonitoringReport {
            generated_at: Utc::now(),
            summary: ReportSummary {
                total_analyses,
                average_score,
                keyword_rankings: snapshots.len(),
                active_alerts,
            },
            recent_analyses,
            keyword_performance: snapshots.into_iter().collect(),
            alerts,
            content_quality: self.content_quality().await,
            keyword_health: health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scorer::analyze;
    use crate::ops::alerting::{AlertKind, AlertSeverity};

    fn analysis_with_score(url: &str, score: u8) -> PageAnalysis {
        let mut analysis = analyze("<html><head><title>x</title></head></html>", url);
        analysis.score = score;
        analysis
    }

    #[tokio::test]
    async fn test_history_evicts_oldest() {
        let store = MonitoringStore::new(3);
        for i in 0..5u8 {
            store
                .push_analysis(analysis_with_score(&format!("https://a.com/{}", i), i))
                .await;
        }
        assert_eq!(store.analysis_count().await, 3);
        let urls: Vec<String> = store.recent(10).await.into_iter().map(|a| a.url).collect();
        assert_eq!(urls, vec!["https://a.com/2", "https://a.com/3", "https://a.com/4"]);
    }

    #[tokio::test]
    async fn test_latest_for_url() {
        let store = MonitoringStore::default();
        store.push_analysis(analysis_with_score("https://a.com/", 40)).await;
        store.push_analysis(analysis_with_score("https://b.com/", 90)).await;
        store.push_analysis(analysis_with_score("https://a.com/", 55)).await;

        assert_eq!(store.latest_for("https://a.com/").await.unwrap().score, 55);
        assert!(store.latest_for("https://c.com/").await.is_none());
    }

    #[test]
    fn test_content_quality_grades() {
        assert_eq!(ContentQuality::from_scores(&[80, 90]).status, QualityStatus::Good);
        assert_eq!(ContentQuality::from_scores(&[70]).status, QualityStatus::Warning);
        assert_eq!(ContentQuality::from_scores(&[50]).status, QualityStatus::Poor);
        assert_eq!(ContentQuality::from_scores(&[]).status, QualityStatus::Unknown);
    }

    #[tokio::test]
    async fn test_content_quality_uses_last_ten() {
        let store = MonitoringStore::default();
        for _ in 0..10 {
            store.push_analysis(analysis_with_score("https://a.com/", 10)).await;
        }
        for _ in 0..10 {
            store.push_analysis(analysis_with_score("https://a.com/", 90)).await;
        }
        let quality = store.content_quality().await;
        assert_eq!(quality.status, QualityStatus::Good);
        assert_eq!(quality.sample_size, 10);
        assert!((quality.average_score - 90.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_report_summary() {
        let store = MonitoringStore::default();
        for score in [60, 70, 80, 90, 100, 50] {
            store.push_analysis(analysis_with_score("https://a.com/", score)).await;
        }
        for i in 0..12 {
            store
                .push_alert(Alert::new(
                    AlertSeverity::Low,
                    AlertKind::SignalsChanged,
                    "fingerprint",
                    f64::from(i),
                    "changed",
                ))
                .await;
        }
        store
            .update_rankings(vec![RankingSnapshot::unavailable("video greetings")])
            .await;

        let report = store.report().await;
        assert_eq!(report.summary.total_analyses, 6);
        assert!((report.summary.average_score - 75.0).abs() < f64::EPSILON);
        assert_eq!(report.summary.keyword_rankings, 1);
        assert_eq!(report.summary.active_alerts, 12);
        assert_eq!(report.recent_analyses.len(), 5);
        assert_eq!(report.recent_analyses[0].score, 70);
        assert_eq!(report.alerts.len(), 10);
        assert_eq!(report.keyword_health, KeywordHealth::Unknown);
    }

    #[tokio::test]
    async fn test_alerts_bounded() {
        let store = MonitoringStore::with_capacities(10, 2);
        for i in 0..3 {
            store
                .push_alert(Alert::new(AlertSeverity::High, AlertKind::LowScore, "seo_score", f64::from(i), "low"))
                .await;
        }
        let alerts = store.recent_alerts(10).await;
        assert_eq!(alerts.len(), 2);
        assert!((alerts[0].value - 1.0).abs() < f64::EPSILON);
    }
}
