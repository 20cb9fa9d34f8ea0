// * Alerting - SEO regressions and system health
// * Alert conditions, cooldown bookkeeping and fan-out to handlers

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::constants::{ERROR_RATE_THRESHOLD, LOW_SCORE_THRESHOLD, SCORE_DROP_THRESHOLD};
use crate::engine::scorer::PageAnalysis;
use crate::ops::notify::NotifyError;
use crate::ops::telemetry::{self, StatsCollector};

// * Same (kind, metric, url) is not re-fired inside this window
const DEFAULT_COOLDOWN_SECS: u64 = 1_800;
// * Error-rate alerts need a minimum sample
const MIN_ERROR_RATE_SAMPLE: u64 = 10;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::High => "high",
            AlertSeverity::Medium => "medium",
            AlertSeverity::Low => "low",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Page score below threshold
    LowScore,
    /// Page score fell since the previous audit
    ScoreDrop,
    /// Title/description/H1/social/JSON-LD changed
    SignalsChanged,
    /// Page could not be fetched
    FetchFailure,
    /// Share of failed audits too high
    ErrorRateHigh,
    /// Keyword ranks beyond page three
    RankingLow,
    /// Keyword lost positions
    RankingDrop,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertKind::LowScore => "LOW_SCORE",
            AlertKind::ScoreDrop => "SCORE_DROP",
            AlertKind::SignalsChanged => "SIGNALS_CHANGED",
            AlertKind::FetchFailure => "FETCH_FAILURE",
            AlertKind::ErrorRateHigh => "ERROR_RATE_HIGH",
            AlertKind::RankingLow => "RANKING_LOW",
            AlertKind::RankingDrop => "RANKING_DROP",
        };
        f.write_str(name)
    }
}

/// An alert event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub metric: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Alert {
    /// Creates a new alert
    pub fn new(
        severity: AlertSeverity,
        kind: AlertKind,
        metric: impl Into<String>,
        value: f64,
        message: impl Into<String>,
    ) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let timestamp = Utc::now();
        Self {
            id: format!(
                "alert-{}-{}",
                timestamp.timestamp_millis(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ),
            severity,
            kind,
            metric: metric.into(),
            value,
            threshold: None,
            message: message.into(),
            url: None,
            timestamp,
            context: BTreeMap::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds context to the alert
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    fn cooldown_key(&self) -> (AlertKind, String, String) {
        (
            self.kind,
            self.metric.clone(),
            self.url.clone().unwrap_or_default(),
        )
    }

    /// Logs the alert using tracing
    pub fn log(&self) {
        let url = self.url.as_deref().unwrap_or("-");
        match self.severity {
            AlertSeverity::Critical | AlertSeverity::High => {
                tracing::error!(
                    alert_id = %self.id,
                    severity = %self.severity,
                    kind = %self.kind,
                    metric = %self.metric,
                    value = self.value,
                    url = %url,
                    "ALERT: {}", self.message
                );
            }
            AlertSeverity::Medium => {
                tracing::warn!(
                    alert_id = %self.id,
                    severity = %self.severity,
                    kind = %self.kind,
                    metric = %self.metric,
                    value = self.value,
                    url = %url,
                    "ALERT: {}", self.message
                );
            }
            AlertSeverity::Low => {
                tracing::info!(
                    alert_id = %self.id,
                    severity = %self.severity,
                    kind = %self.kind,
                    metric = %self.metric,
                    value = self.value,
                    url = %url,
                    "ALERT: {}", self.message
                );
            }
        }
    }
}

/// Trait for alert handlers
pub trait AlertHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Delivers an alert. Errors are logged by the manager, never propagated.
    fn handle(&self, alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>>;
}

/// Console handler
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl AlertHandler for LoggingHandler {
    fn name(&self) -> &'static str {
        "console"
    }

    fn handle(&self, alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>> {
        alert.log();
        Box::pin(async { Ok(()) })
    }
}

/// Configuration for the alert manager
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub low_score_threshold: u8,
    pub score_drop_threshold: u8,
    pub error_rate_threshold: f64,
    /// Cooldown before re-firing the same alert
    pub alert_cooldown_seconds: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            low_score_threshold: LOW_SCORE_THRESHOLD,
            score_drop_threshold: SCORE_DROP_THRESHOLD,
            error_rate_threshold: ERROR_RATE_THRESHOLD,
            alert_cooldown_seconds: DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// Alert manager: evaluates conditions, suppresses repeats, fans out to handlers
pub struct AlertManager {
    handlers: Vec<Arc<dyn AlertHandler>>,
    last_fired: RwLock<HashMap<(AlertKind, String, String), DateTime<Utc>>>,
    stats: StatsCollector,
    config: AlertConfig,
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("handler_count", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl AlertManager {
    /// Creates a new alert manager with the console handler only
    pub fn new() -> Self {
        Self::with_config(AlertConfig::default())
    }

    pub fn with_config(config: AlertConfig) -> Self {
        Self {
            handlers: vec![Arc::new(LoggingHandler)],
            last_fired: RwLock::new(HashMap::new()),
            stats: StatsCollector::new(),
            config,
        }
    }

    /// Creates a manager with no handlers at all
    pub fn silent(config: AlertConfig) -> Self {
        Self {
            handlers: Vec::new(),
            ..Self::with_config(config)
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn AlertHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Fires an alert unless the same one fired within the cooldown.
    /// Returns true when the alert was dispatched.
    pub async fn fire_alert(&self, alert: &Alert) -> bool {
        let key = alert.cooldown_key();
        let cooldown = chrono::Duration::from_std(Duration::from_secs(self.config.alert_cooldown_seconds))
            .unwrap_or_else(|_| chrono::Duration::zero());

        {
            let mut last_fired = self.last_fired.write().await;
            if let Some(previous) = last_fired.get(&key) {
                if alert.timestamp - *previous < cooldown {
                    tracing::debug!(kind = %alert.kind, metric = %alert.metric, "Alert in cooldown");
                    return false;
                }
            }
            last_fired.insert(key, alert.timestamp);
        }

        telemetry::record_alert(alert.severity.as_str());

        let deliveries = self.handlers.iter().map(|handler| {
            let name = handler.name();
            let fut = handler.handle(alert);
            async move { (name, fut.await) }
        });
        for (name, result) in join_all(deliveries).await {
            if let Err(e) = result {
                tracing::error!(handler = name, error = %e, "Alert delivery failed");
            }
        }

        true
    }

    /// Fires every alert in order; returns those that were dispatched
    pub async fn fire_all(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        let mut fired = Vec::new();
        for alert in alerts {
            if self.fire_alert(&alert).await {
                fired.push(alert);
            }
        }
        fired
    }

    /// Audit conditions comparing the fresh analysis with the previous one for the same URL
    pub fn audit_alerts(&self, previous: Option<&PageAnalysis>, current: &PageAnalysis) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if current.score < self.config.low_score_threshold {
            alerts.push(
                Alert::new(
                    AlertSeverity::High,
                    AlertKind::LowScore,
                    "seo_score",
                    f64::from(current.score),
                    format!(
                        "SEO score {} is below {}",
                        current.score, self.config.low_score_threshold
                    ),
                )
                .with_threshold(f64::from(self.config.low_score_threshold))
                .with_url(&current.url)
                .with_context("issues", current.issues.len().to_string()),
            );
        }

        if let Some(previous) = previous {
            let drop = previous.score.saturating_sub(current.score);
            if drop >= self.config.score_drop_threshold {
                alerts.push(
                    Alert::new(
                        AlertSeverity::Medium,
                        AlertKind::ScoreDrop,
                        "seo_score_change",
                        -f64::from(drop),
                        format!(
                            "SEO score dropped from {} to {}",
                            previous.score, current.score
                        ),
                    )
                    .with_threshold(f64::from(self.config.score_drop_threshold))
                    .with_url(&current.url)
                    .with_context("previous_score", previous.score.to_string()),
                );
            }

            if previous.fingerprint != current.fingerprint {
                alerts.push(
                    Alert::new(
                        AlertSeverity::Low,
                        AlertKind::SignalsChanged,
                        "signal_fingerprint",
                        0.0,
                        "Title, description, headings or social tags changed",
                    )
                    .with_url(&current.url)
                    .with_context("previous", previous.fingerprint.clone())
                    .with_context("current", current.fingerprint.clone()),
                );
            }
        }

        alerts
    }

    pub fn fetch_failure_alert(&self, url: &str, error: &str) -> Alert {
        Alert::new(
            AlertSeverity::High,
            AlertKind::FetchFailure,
            "fetch",
            1.0,
            format!("Failed to fetch page: {}", error),
        )
        .with_url(url)
    }

    /// Records an audit outcome for error-rate tracking
    pub fn record_success(&self) {
        self.stats.record_success();
        telemetry::set_audit_error_rate(self.stats.get_error_rate());
    }

    pub fn record_failure(&self) {
        self.stats.record_failure();
        telemetry::set_audit_error_rate(self.stats.get_error_rate());
    }

    pub fn error_rate(&self) -> f64 {
        self.stats.get_error_rate()
    }

    /// System alert when the error rate crosses the threshold with enough samples
    pub fn error_rate_alert(&self) -> Option<Alert> {
        if self.stats.total() < MIN_ERROR_RATE_SAMPLE {
            return None;
        }
        let rate = self.stats.get_error_rate();
        (rate > self.config.error_rate_threshold).then(|| {
            Alert::new(
                AlertSeverity::High,
                AlertKind::ErrorRateHigh,
                "error_rate",
                rate,
                format!(
                    "Audit error rate {:.1}% above {:.1}%",
                    rate * 100.0,
                    self.config.error_rate_threshold * 100.0
                ),
            )
            .with_threshold(self.config.error_rate_threshold)
        })
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scorer::analyze;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler(Arc<AtomicUsize>);

    impl AlertHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn handle(&self, _alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Box::pin(async { Ok(()) })
        }
    }

    struct FailingHandler;

    impl AlertHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn handle(&self, _alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>> {
            Box::pin(async { Err(NotifyError::Rejected(500)) })
        }
    }

    fn counting_manager(cooldown: u64) -> (AlertManager, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let mut manager = AlertManager::silent(AlertConfig {
            alert_cooldown_seconds: cooldown,
            ..Default::default()
        });
        manager.add_handler(Arc::new(CountingHandler(count.clone())));
        (manager, count)
    }

    #[test]
    fn test_alert_builder() {
        let alert = Alert::new(AlertSeverity::High, AlertKind::LowScore, "seo_score", 42.0, "Low")
            .with_threshold(60.0)
            .with_url("https://wishesvideo.com/")
            .with_context("issues", "5");

        assert_eq!(alert.threshold, Some(60.0));
        assert_eq!(alert.url.as_deref(), Some("https://wishesvideo.com/"));
        assert_eq!(alert.context.get("issues"), Some(&"5".to_string()));
        assert!(alert.id.starts_with("alert-"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AlertSeverity::High.to_string(), "HIGH");
        assert_eq!(AlertKind::ScoreDrop.to_string(), "SCORE_DROP");
    }

    #[test]
    fn test_serialized_shape() {
        let alert = Alert::new(AlertSeverity::Low, AlertKind::SignalsChanged, "fp", 0.0, "x");
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["severity"], "low");
        assert_eq!(json["kind"], "signals_changed");
        assert!(json.get("threshold").is_none());
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_repeat() {
        let (manager, count) = counting_manager(3_600);
        let alert = manager.fetch_failure_alert("https://wishesvideo.com/", "timeout");

        assert!(manager.fire_alert(&alert).await);
        let again = manager.fetch_failure_alert("https://wishesvideo.com/", "timeout");
        assert!(!manager.fire_alert(&again).await);
        assert_eq!(count.load(Ordering::Relaxed), 1);

        // * Different URL is a different key
        let other = manager.fetch_failure_alert("https://wishesvideo.com/about", "timeout");
        assert!(manager.fire_alert(&other).await);
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_zero_cooldown_always_fires() {
        let (manager, count) = counting_manager(0);
        for _ in 0..3 {
            let alert = manager.fetch_failure_alert("https://wishesvideo.com/", "boom");
            manager.fire_alert(&alert).await;
        }
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_propagate() {
        let (mut manager, count) = counting_manager(0);
        manager.add_handler(Arc::new(FailingHandler));

        let alert = manager.fetch_failure_alert("https://wishesvideo.com/", "boom");
        assert!(manager.fire_alert(&alert).await);
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_audit_alerts_low_score() {
        let manager = AlertManager::new();
        let current = analyze("<html></html>", "https://wishesvideo.com/");

        let alerts = manager.audit_alerts(None, &current);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowScore);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_audit_alerts_drop_and_change() {
        let manager = AlertManager::new();
        let url = "https://wishesvideo.com/";
        let good = format!(
            r#"<title>{}</title><meta name="description" content="{}"><h1>Hi</h1>
               <script type="application/ld+json">{{"@type":"Organization"}}</script>"#,
            "t".repeat(40),
            "d".repeat(130)
        );
        let worse = format!(r#"<title>{}</title><h1>Hi</h1>"#, "t".repeat(40));

        let previous = analyze(&good, url);
        let current = analyze(&worse, url);
        let kinds: Vec<_> = manager
            .audit_alerts(Some(&previous), &current)
            .into_iter()
            .map(|a| a.kind)
            .collect();

        assert!(kinds.contains(&AlertKind::LowScore));
        assert!(kinds.contains(&AlertKind::ScoreDrop));
        assert!(kinds.contains(&AlertKind::SignalsChanged));
    }

    #[test]
    fn test_error_rate_needs_sample() {
        let manager = AlertManager::new();
        for _ in 0..5 {
            manager.record_failure();
        }
        assert!(manager.error_rate_alert().is_none());

        for _ in 0..5 {
            manager.record_success();
        }
        let alert = manager.error_rate_alert().unwrap();
        assert_eq!(alert.kind, AlertKind::ErrorRateHigh);
        assert!((alert.value - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_error_rate_below_threshold() {
        let manager = AlertManager::new();
        for _ in 0..20 {
            manager.record_success();
        }
        manager.record_failure();
        assert!(manager.error_rate_alert().is_none());
    }
}
