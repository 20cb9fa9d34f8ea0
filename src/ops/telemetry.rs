// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logs for every audit/alert/run, counters exposed at /metrics

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, CounterVec, Encoder, Gauge,
    Histogram, TextEncoder,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// * Default filter when RUST_LOG is unset
const DEFAULT_FILTER: &str = "seo_sentinel=info";

lazy_static! {
    // * Audits by outcome (success / failure / skipped)
    pub static ref AUDITS_TOTAL: CounterVec = register_counter_vec!(
        "seo_audits_total",
        "Total page audits by status",
        &["status"]
    ).unwrap();

    // * Distribution of page scores
    pub static ref AUDIT_SCORE: Histogram = register_histogram!(
        "seo_audit_score",
        "SEO score of audited pages",
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    ).unwrap();

    // * Fetch latency
    pub static ref FETCH_DURATION: Histogram = register_histogram!(
        "seo_fetch_duration_seconds",
        "Page fetch duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]
    ).unwrap();

    // * Alerts raised by severity
    pub static ref ALERTS_TOTAL: CounterVec = register_counter_vec!(
        "seo_alerts_total",
        "Alerts raised by severity",
        &["severity"]
    ).unwrap();

    // * Scheduler task runs
    pub static ref SCHEDULED_RUNS_TOTAL: CounterVec = register_counter_vec!(
        "seo_scheduled_runs_total",
        "Scheduled task runs by task and status",
        &["task", "status"]
    ).unwrap();

    // * Audit error rate (0.0 - 1.0)
    pub static ref AUDIT_ERROR_RATE: Gauge = register_gauge!(
        "seo_audit_error_rate",
        "Audit error rate as a ratio (0.0 - 1.0)"
    ).unwrap();

    // * Analyses held in memory
    pub static ref HISTORY_SIZE: Gauge = register_gauge!(
        "seo_history_size",
        "Analyses held in the monitoring store"
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use seo_sentinel::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "https://wishesvideo.com", score = 87, "Page audited");
/// ```
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("seo_sentinel=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();
}

/// Returns the current metrics in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Content type of [`get_metrics_string`]
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Records a successful audit and its score
pub fn record_audit_success(score: u8) {
    AUDITS_TOTAL.with_label_values(&["success"]).inc();
    AUDIT_SCORE.observe(f64::from(score));
}

/// Records a failed audit (fetch error)
pub fn record_audit_failure() {
    AUDITS_TOTAL.with_label_values(&["failure"]).inc();
}

/// Records a URL skipped because robots.txt disallows it
pub fn record_audit_skipped() {
    AUDITS_TOTAL.with_label_values(&["skipped"]).inc();
}

pub fn record_fetch_duration(seconds: f64) {
    FETCH_DURATION.observe(seconds);
}

pub fn record_alert(severity: &str) {
    ALERTS_TOTAL.with_label_values(&[severity]).inc();
}

pub fn record_scheduled_run(task: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    SCHEDULED_RUNS_TOTAL.with_label_values(&[task, status]).inc();
}

pub fn set_audit_error_rate(rate: f64) {
    AUDIT_ERROR_RATE.set(rate.clamp(0.0, 1.0));
}

pub fn set_history_size(size: usize) {
    HISTORY_SIZE.set(size as f64);
}

/// Success/failure counter for computing rates
#[derive(Debug, Default)]
pub struct StatsCollector {
    success_count: AtomicU64,
    failure_count: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed) + self.failure_count.load(Ordering::Relaxed)
    }

    pub fn get_success_rate(&self) -> f64 {
        let success = self.success_count.load(Ordering::Relaxed) as f64;
        let total = self.total() as f64;
        if total > 0.0 {
            success / total
        } else {
            1.0
        }
    }

    pub fn get_error_rate(&self) -> f64 {
        1.0 - self.get_success_rate()
    }

    pub fn reset(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_audits() {
        record_audit_success(87);
        record_audit_failure();
        record_audit_skipped();
        assert!(AUDITS_TOTAL.with_label_values(&["success"]).get() >= 1.0);
    }

    #[test]
    fn test_rate_clamping() {
        set_audit_error_rate(1.5);
        assert!((AUDIT_ERROR_RATE.get() - 1.0).abs() < f64::EPSILON);
        set_audit_error_rate(-0.5);
        assert!(AUDIT_ERROR_RATE.get().abs() < f64::EPSILON);
    }

    #[test]
    fn test_get_metrics_string() {
        record_scheduled_run("hourly", true);
        let metrics = get_metrics_string();
        assert!(metrics.contains("seo_scheduled_runs_total"));
    }

    #[test]
    fn test_stats_collector() {
        let collector = StatsCollector::new();

        collector.record_success();
        collector.record_success();
        collector.record_failure();

        assert!((collector.get_success_rate() - 0.666666).abs() < 0.01);
        assert!((collector.get_error_rate() - 0.333333).abs() < 0.01);
        assert_eq!(collector.total(), 3);
    }

    #[test]
    fn test_stats_collector_empty() {
        let collector = StatsCollector::new();
        assert!((collector.get_success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_collector_reset() {
        let collector = StatsCollector::new();
        collector.record_failure();
        collector.reset();
        assert_eq!(collector.total(), 0);
    }
}
