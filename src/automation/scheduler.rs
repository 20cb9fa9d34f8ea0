// * Scheduled monitoring
// * One tokio task per schedule; each ticks on its own interval until shutdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval_at, MissedTickBehavior};

use crate::config::{AppConfig, ScheduleConfig};
use crate::engine::auditor::{summarize, BatchSummary, SiteAuditor};
use crate::engine::scorer::PageAnalysis;
use crate::keywords::competitors::{competitor_profiles, keyword_overlap, KeywordOverlap};
use crate::keywords::rankings::{
    check_rankings, keyword_health, ranking_alerts, KeywordHealth, RankingSnapshot, RankingSource,
};
use crate::ops::alerting::{Alert, AlertManager};
use crate::ops::notify::MailSpoolHandler;
use crate::ops::telemetry;
use crate::persistence::history::{ContentQuality, MonitoringReport, MonitoringStore, QualityStatus};
use crate::persistence::report::render_monitoring_html;
use crate::persistence::store::{ReportKind, ReportStore, RetentionSummary, StoreError};

// * Only the most recent task errors are kept in memory
const MAX_STATUS_ERRORS: usize = 50;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("All {0} audits failed")]
    AllAuditsFailed(usize),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledTask {
    Hourly,
    Daily,
    Competitor,
    Weekly,
    Monthly,
    Keywords,
}

impl ScheduledTask {
    pub const ALL: [ScheduledTask; 6] = [
        ScheduledTask::Hourly,
        ScheduledTask::Daily,
        ScheduledTask::Competitor,
        ScheduledTask::Weekly,
        ScheduledTask::Monthly,
        ScheduledTask::Keywords,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScheduledTask::Hourly => "hourly",
            ScheduledTask::Daily => "daily",
            ScheduledTask::Competitor => "competitor",
            ScheduledTask::Weekly => "weekly",
            ScheduledTask::Monthly => "monthly",
            ScheduledTask::Keywords => "keywords",
        }
    }

    /// Configured period; zero disables the schedule
    pub fn period(&self, schedules: &ScheduleConfig) -> Duration {
        let secs = match self {
            ScheduledTask::Hourly => schedules.hourly_check,
            ScheduledTask::Daily => schedules.daily_report,
            ScheduledTask::Competitor => schedules.competitor_check,
            ScheduledTask::Weekly => schedules.weekly_analysis,
            ScheduledTask::Monthly => schedules.monthly_report,
            ScheduledTask::Keywords => schedules.keyword_check,
        };
        Duration::from_secs(secs)
    }
}

impl FromStr for ScheduledTask {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduledTask::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| SchedulerError::UnknownTask(s.to_string()))
    }
}

impl std::fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed run, kept in the status and written to `logs/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub task_type: ScheduledTask,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub average_run_time_ms: f64,
    /// Percentage of successful runs
    pub success_rate: f64,
    pub errors: Vec<TaskError>,
    pub is_running: bool,
    pub scheduled_tasks: Vec<ScheduledTask>,
}

#[derive(Debug, Default)]
struct StatusTracker {
    last_run: Option<DateTime<Utc>>,
    total_runs: u64,
    successful_runs: u64,
    total_success_ms: f64,
    errors: VecDeque<TaskError>,
}

impl StatusTracker {
    fn record(&mut self, duration: Duration, error: Option<TaskError>) {
        self.last_run = Some(Utc::now());
        self.total_runs += 1;
        match error {
            None => {
                self.successful_runs += 1;
                self.total_success_ms += duration.as_secs_f64() * 1000.0;
            }
            Some(error) => {
                self.errors.push_back(error);
                while self.errors.len() > MAX_STATUS_ERRORS {
                    self.errors.pop_front();
                }
            }
        }
    }

    fn snapshot(&self, is_running: bool, scheduled_tasks: Vec<ScheduledTask>) -> SystemStatus {
        let average_run_time_ms = if self.successful_runs == 0 {
            0.0
        } else {
            self.total_success_ms / self.successful_runs as f64
        };
        let success_rate = if self.total_runs == 0 {
            100.0
        } else {
            self.successful_runs as f64 / self.total_runs as f64 * 100.0
        };
        SystemStatus {
            last_run: self.last_run,
            total_runs: self.total_runs,
            successful_runs: self.successful_runs,
            average_run_time_ms,
            success_rate,
            errors: self.errors.iter().cloned().collect(),
            is_running,
            scheduled_tasks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub task: ScheduledTask,
    pub duration_ms: u64,
    pub audited: usize,
    pub alerts_fired: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Good,
    Warning,
    Poor,
}

impl OverallHealth {
    /// Poor content dominates; weak content or rankings give a warning
    pub fn assess(content: &ContentQuality, keywords: KeywordHealth) -> Self {
        match (content.status, keywords) {
            (QualityStatus::Poor, _) => OverallHealth::Poor,
            (QualityStatus::Warning, _) | (_, KeywordHealth::NeedsImprovement) => OverallHealth::Warning,
            _ => OverallHealth::Good,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChecks {
    pub keyword_rankings: KeywordHealth,
    pub technical_seo: BatchSummary,
    pub content_quality: ContentQuality,
    pub competitor_activity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub timestamp: DateTime<Utc>,
    pub overall_health: OverallHealth,
    pub checks: DailyChecks,
    pub report: MonitoringReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorSite {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorReport {
    pub generated_at: DateTime<Utc>,
    pub sites: Vec<CompetitorSite>,
    pub keyword_overlap: Vec<KeywordOverlap>,
}

/// First and latest score seen for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTrend {
    pub url: String,
    pub first_score: u8,
    pub latest_score: u8,
    pub change: i16,
}

pub fn score_trends(analyses: &[PageAnalysis]) -> Vec<ScoreTrend> {
    let mut by_url: BTreeMap<&str, (u8, u8)> = BTreeMap::new();
    for analysis in analyses {
        by_url
            .entry(analysis.url.as_str())
            .and_modify(|(_, latest)| *latest = analysis.score)
            .or_insert((analysis.score, analysis.score));
    }
    by_url
        .into_iter()
        .map(|(url, (first, latest))| ScoreTrend {
            url: url.to_string(),
            first_score: first,
            latest_score: latest,
            change: i16::from(latest) - i16::from(first),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub generated_at: DateTime<Utc>,
    pub trends: Vec<ScoreTrend>,
    pub report: MonitoringReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub generated_at: DateTime<Utc>,
    pub report: MonitoringReport,
    pub system: SystemStatus,
    pub retention: RetentionSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCheck {
    pub checked_at: DateTime<Utc>,
    pub domain: String,
    pub health: KeywordHealth,
    pub rankings: Vec<RankingSnapshot>,
}

/// Runs monitoring tasks on demand or on their schedules
pub struct Scheduler {
    config: AppConfig,
    auditor: Arc<SiteAuditor>,
    history: Arc<MonitoringStore>,
    store: ReportStore,
    alerts: Arc<AlertManager>,
    rankings: Arc<dyn RankingSource>,
    status: RwLock<StatusTracker>,
    running: AtomicBool,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("target_website", &self.config.target_website)
            .field("rankings", &self.rankings.name())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Scheduler {
    pub fn new(
        config: AppConfig,
        auditor: Arc<SiteAuditor>,
        history: Arc<MonitoringStore>,
        store: ReportStore,
        alerts: Arc<AlertManager>,
        rankings: Arc<dyn RankingSource>,
    ) -> Self {
        Self {
            config,
            auditor,
            history,
            store,
            alerts,
            rankings,
            status: RwLock::new(StatusTracker::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Tasks with a non-zero period
    pub fn scheduled_tasks(&self) -> Vec<ScheduledTask> {
        let schedules = &self.config.automation.schedules;
        ScheduledTask::ALL
            .into_iter()
            .filter(|t| !t.period(schedules).is_zero())
            .collect()
    }

    pub async fn status(&self) -> SystemStatus {
        self.status
            .read()
            .await
            .snapshot(self.is_running(), self.scheduled_tasks())
    }

    /// Runs a task by name
    pub async fn trigger(&self, name: &str) -> Result<TaskOutcome, SchedulerError> {
        let task: ScheduledTask = name.parse()?;
        tracing::info!(task = %task, "Task triggered manually");
        self.run_task(task).await
    }

    /// Runs one task and records the outcome in the system status
    pub async fn run_task(&self, task: ScheduledTask) -> Result<TaskOutcome, SchedulerError> {
        let started = Instant::now();
        tracing::info!(task = %task, "Scheduled task started");

        let result = match task {
            ScheduledTask::Hourly => self.run_hourly().await,
            ScheduledTask::Daily => self.run_daily().await,
            ScheduledTask::Competitor => self.run_competitor().await,
            ScheduledTask::Weekly => self.run_weekly().await,
            ScheduledTask::Monthly => self.run_monthly().await,
            ScheduledTask::Keywords => self.run_keywords().await,
        };
        let duration = started.elapsed();
        telemetry::record_scheduled_run(task.name(), result.is_ok());

        match result {
            Ok(mut outcome) => {
                outcome.duration_ms = duration.as_millis() as u64;
                self.status.write().await.record(duration, None);
                tracing::info!(
                    task = %task,
                    duration_ms = outcome.duration_ms,
                    audited = outcome.audited,
                    alerts_fired = outcome.alerts_fired,
                    "Scheduled task finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(task = %task, error = %e, "Scheduled task failed");
                let now = Utc::now();
                let error = TaskError {
                    id: format!("error-{}", now.timestamp_millis()),
                    timestamp: now,
                    task_type: task,
                    message: e.to_string(),
                };
                if let Err(store_err) = self.store.save(ReportKind::Error, &error).await {
                    tracing::warn!(error = %store_err, "Failed to write error log");
                }
                self.status.write().await.record(duration, Some(error));
                Err(e)
            }
        }
    }

    fn outcome(task: ScheduledTask) -> TaskOutcome {
        TaskOutcome {
            task,
            duration_ms: 0,
            audited: 0,
            alerts_fired: 0,
            report_path: None,
        }
    }

    /// Fires alerts through the manager; dispatched ones are kept and written to `alerts/`
    async fn dispatch_alerts(&self, alerts: Vec<Alert>) -> Result<usize, SchedulerError> {
        if alerts.is_empty() {
            return Ok(0);
        }
        let fired = self.alerts.fire_all(alerts).await;
        if fired.is_empty() {
            return Ok(0);
        }
        self.store.save(ReportKind::Alerts, &fired).await?;
        let count = fired.len();
        self.history.push_alerts(fired).await;
        Ok(count)
    }

    /// Audits the monitored URLs, records history and raises audit alerts
    async fn audit_monitored(&self) -> Result<(Vec<PageAnalysis>, usize), SchedulerError> {
        let urls = self.config.monitored_urls();
        let mut analyses = Vec::with_capacity(urls.len());
        let mut alerts = Vec::new();

        for url in &urls {
            match self.auditor.audit_url(url).await {
                Ok(analysis) => {
                    self.alerts.record_success();
                    let previous = self.history.latest_for(url).await;
                    alerts.extend(self.alerts.audit_alerts(previous.as_ref(), &analysis));
                    self.history.push_analysis(analysis.clone()).await;
                    analyses.push(analysis);
                }
                Err(e) => {
                    self.alerts.record_failure();
                    alerts.push(self.alerts.fetch_failure_alert(url, &e.to_string()));
                }
            }
        }
        alerts.extend(self.alerts.error_rate_alert());

        let fired = self.dispatch_alerts(alerts).await?;
        if analyses.is_empty() && !urls.is_empty() {
            return Err(SchedulerError::AllAuditsFailed(urls.len()));
        }
        Ok((analyses, fired))
    }

    async fn run_hourly(&self) -> Result<TaskOutcome, SchedulerError> {
        let (analyses, fired) = self.audit_monitored().await?;
        Ok(TaskOutcome {
            audited: analyses.len(),
            alerts_fired: fired,
            ..Self::outcome(ScheduledTask::Hourly)
        })
    }

    async fn run_daily(&self) -> Result<TaskOutcome, SchedulerError> {
        let (analyses, fired) = self.audit_monitored().await?;
        let refs: Vec<&PageAnalysis> = analyses.iter().collect();

        let report = self.history.report().await;
        let content_quality = report.content_quality.clone();
        let keyword_rankings = report.keyword_health;
        let daily = DailyReport {
            timestamp: Utc::now(),
            overall_health: OverallHealth::assess(&content_quality, keyword_rankings),
            checks: DailyChecks {
                keyword_rankings,
                technical_seo: summarize(&refs),
                content_quality,
                competitor_activity: self.config.monitoring.competitors.len(),
            },
            report,
        };
        let path = self.store.save(ReportKind::Daily, &daily).await?;

        if self.config.automation.notifications.email {
            if let Some(email) = &self.config.email {
                let subject = format!(
                    "[SEO Report] {} daily report ({:?})",
                    self.config.target_website, daily.overall_health
                );
                // * Mail failures never fail the run
                if let Err(e) = MailSpoolHandler::new(email)
                    .spool(&subject, &render_monitoring_html(&daily.report))
                    .await
                {
                    tracing::warn!(error = %e, outbox = %email.outbox_dir.display(), "Daily report mail not spooled");
                }
            }
        }

        Ok(TaskOutcome {
            audited: analyses.len(),
            alerts_fired: fired,
            report_path: Some(path),
            ..Self::outcome(ScheduledTask::Daily)
        })
    }

    async fn run_competitor(&self) -> Result<TaskOutcome, SchedulerError> {
        let mut sites = Vec::new();
        for domain in &self.config.monitoring.competitors {
            let url = format!("https://{}", domain.trim_end_matches('/'));
            let site = match self.auditor.audit_url(&url).await {
                Ok(analysis) => CompetitorSite {
                    domain: domain.clone(),
                    score: Some(analysis.score),
                    title: Some(analysis.title().to_string()).filter(|t| !t.is_empty()),
                    error: None,
                },
                Err(e) => CompetitorSite {
                    domain: domain.clone(),
                    score: None,
                    title: None,
                    error: Some(e.to_string()),
                },
            };
            sites.push(site);
        }

        let audited = sites.iter().filter(|s| s.score.is_some()).count();
        let report = CompetitorReport {
            generated_at: Utc::now(),
            sites,
            keyword_overlap: keyword_overlap(&competitor_profiles(), &self.config.monitoring.keywords),
        };
        let path = self.store.save(ReportKind::Competitor, &report).await?;

        Ok(TaskOutcome {
            audited,
            report_path: Some(path),
            ..Self::outcome(ScheduledTask::Competitor)
        })
    }

    async fn run_weekly(&self) -> Result<TaskOutcome, SchedulerError> {
        let history = self.history.recent(self.history.capacity()).await;
        let weekly = WeeklyReport {
            generated_at: Utc::now(),
            trends: score_trends(&history),
            report: self.history.report().await,
        };
        let path = self.store.save(ReportKind::Weekly, &weekly).await?;
        Ok(TaskOutcome {
            report_path: Some(path),
            ..Self::outcome(ScheduledTask::Weekly)
        })
    }

    async fn run_monthly(&self) -> Result<TaskOutcome, SchedulerError> {
        let retention = self
            .store
            .apply_retention(&self.config.automation.data_retention)
            .await?;
        let monthly = MonthlyReport {
            generated_at: Utc::now(),
            report: self.history.report().await,
            system: self.status().await,
            retention,
        };
        let path = self.store.save(ReportKind::Monthly, &monthly).await?;
        Ok(TaskOutcome {
            report_path: Some(path),
            ..Self::outcome(ScheduledTask::Monthly)
        })
    }

    /// Ranking check; provider failures show up as `unavailable` snapshots, not errors
    pub async fn check_keywords(&self) -> Result<(KeywordCheck, usize), SchedulerError> {
        let previous = self.history.rankings().await;
        let snapshots = check_rankings(
            self.rankings.as_ref(),
            &self.config.target_website,
            &self.config.monitoring.keywords,
            &previous,
        )
        .await;

        let fired = self.dispatch_alerts(ranking_alerts(&snapshots)).await?;
        self.history.update_rankings(snapshots.clone()).await;

        let check = KeywordCheck {
            checked_at: Utc::now(),
            domain: self.config.target_website.clone(),
            health: keyword_health(&snapshots),
            rankings: snapshots,
        };
        Ok((check, fired))
    }

    async fn run_keywords(&self) -> Result<TaskOutcome, SchedulerError> {
        let (check, fired) = self.check_keywords().await?;
        let path = self.store.save(ReportKind::Keywords, &check).await?;
        Ok(TaskOutcome {
            alerts_fired: fired,
            report_path: Some(path),
            ..Self::outcome(ScheduledTask::Keywords)
        })
    }

    /// Spawns one loop per enabled schedule
    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let tasks = self.scheduled_tasks();
        self.running.store(true, Ordering::Relaxed);

        let join_handles = tasks
            .iter()
            .map(|task| {
                let scheduler = Arc::clone(self);
                let shutdown_rx = shutdown_tx.subscribe();
                let task = *task;
                tokio::spawn(async move { scheduler.task_loop(task, shutdown_rx).await })
            })
            .collect();

        tracing::info!(
            target_website = %self.config.target_website,
            tasks = ?tasks.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "Scheduler started"
        );

        SchedulerHandle {
            scheduler: Arc::clone(self),
            shutdown_tx,
            join_handles,
        }
    }

    async fn task_loop(self: Arc<Self>, task: ScheduledTask, mut shutdown_rx: broadcast::Receiver<()>) {
        let period = task.period(&self.config.automation.schedules);
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(task = %task, period_secs = period.as_secs(), "Task loop started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::debug!(task = %task, "Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    // * Failures are already logged and recorded in the status
                    let _ = self.run_task(task).await;
                }
            }
        }
    }
}

/// Handle for the running schedule loops
pub struct SchedulerHandle {
    scheduler: Arc<Scheduler>,
    shutdown_tx: broadcast::Sender<()>,
    join_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn task_count(&self) -> usize {
        self.join_handles.len()
    }

    /// Signals every loop and waits for them to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.join_handles {
            let _ = handle.await;
        }
        self.scheduler.running.store(false, Ordering::Relaxed);
        tracing::info!("Scheduler stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.join_handles.iter().all(|h| h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatchConfig, EmailConfig};
    use crate::keywords::rankings::UnavailableRankings;
    use crate::network::{AsyncResult, FetchError, FetchedPage, PageSource};
    use std::collections::HashMap;

    const GOOD_PAGE: &str = r#"<html><head>
        <title>Personalized Video Messages for Every Occasion | WishesVideo</title>
        <meta name="description" content="Order personalized video messages and custom greetings from creators around the world. Birthday, wedding and graduation videos delivered fast.">
        <meta property="og:title" content="WishesVideo"><meta property="og:description" content="Video greetings">
        <meta property="og:image" content="https://wishesvideo.com/og.jpg"><meta name="twitter:card" content="summary">
        <script type="application/ld+json">{"@type":"Organization","name":"WishesVideo"}</script>
        </head><body><h1>Video greetings</h1><img src="a.jpg" alt="Birthday video"></body></html>"#;

    struct CannedSite(HashMap<String, String>);

    impl PageSource for CannedSite {
        fn fetch_page(&self, url: &str) -> AsyncResult<FetchedPage> {
            let result = match self.0.get(url) {
                Some(body) => Ok(FetchedPage {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    status: 200,
                    body: body.clone(),
                    elapsed_ms: 12,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            };
            Box::pin(async move { result })
        }
    }

    fn scheduler(pages: &[(&str, &str)], config: AppConfig, root: &std::path::Path) -> Arc<Scheduler> {
        let site = CannedSite(pages.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect());
        let batch = BatchConfig {
            pause_ms: 0,
            ..BatchConfig::default()
        };
        let auditor = Arc::new(SiteAuditor::new(Arc::new(site), "SEOSentinel", batch));
        Arc::new(Scheduler::new(
            config,
            auditor,
            Arc::new(MonitoringStore::default()),
            ReportStore::new(root),
            Arc::new(AlertManager::silent(Default::default())),
            Arc::new(UnavailableRankings),
        ))
    }

    #[test]
    fn test_task_names_round_trip() {
        for task in ScheduledTask::ALL {
            assert_eq!(task.name().parse::<ScheduledTask>().unwrap(), task);
        }
        assert!(matches!(
            "fortnightly".parse::<ScheduledTask>(),
            Err(SchedulerError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_overall_health() {
        let good = ContentQuality::from_scores(&[90]);
        let poor = ContentQuality::from_scores(&[20]);
        assert_eq!(OverallHealth::assess(&good, KeywordHealth::Good), OverallHealth::Good);
        assert_eq!(OverallHealth::assess(&good, KeywordHealth::NeedsImprovement), OverallHealth::Warning);
        assert_eq!(OverallHealth::assess(&poor, KeywordHealth::Good), OverallHealth::Poor);
    }

    #[test]
    fn test_score_trends() {
        let mut a = crate::engine::scorer::analyze("<title>x</title>", "https://a.com/");
        a.score = 40;
        let mut b = a.clone();
        b.score = 65;
        let trends = score_trends(&[a, b]);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].change, 25);
    }

    #[tokio::test]
    async fn test_trigger_unknown_task() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[], AppConfig::default(), tmp.path());
        assert!(matches!(s.trigger("nightly").await, Err(SchedulerError::UnknownTask(_))));
        assert_eq!(s.status().await.total_runs, 0);
    }

    #[tokio::test]
    async fn test_hourly_audits_and_alerts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.monitoring.urls = vec![
            "https://wishesvideo.com/".to_string(),
            "https://wishesvideo.com/bare".to_string(),
        ];
        let s = scheduler(
            &[
                ("https://wishesvideo.com/", GOOD_PAGE),
                ("https://wishesvideo.com/bare", "<html><body>hi</body></html>"),
            ],
            config,
            tmp.path(),
        );

        let outcome = s.trigger("hourly").await.unwrap();
        assert_eq!(outcome.audited, 2);
        // * The bare page scores below 60
        assert_eq!(outcome.alerts_fired, 1);
        assert_eq!(s.history.analysis_count().await, 2);
        assert_eq!(s.history.alert_count().await, 1);
        assert_eq!(s.store.list(ReportKind::Alerts).await.unwrap().len(), 1);

        let status = s.status().await;
        assert_eq!(status.total_runs, 1);
        assert!((status.success_rate - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_failed_run_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[], AppConfig::default(), tmp.path());

        assert!(matches!(
            s.run_task(ScheduledTask::Hourly).await,
            Err(SchedulerError::AllAuditsFailed(1))
        ));
        let status = s.status().await;
        assert_eq!(status.total_runs, 1);
        assert_eq!(status.successful_runs, 0);
        assert_eq!(status.errors.len(), 1);
        assert_eq!(status.errors[0].task_type, ScheduledTask::Hourly);
        assert_eq!(s.store.list(ReportKind::Error).await.unwrap().len(), 1);
        // * The fetch failure itself raised an alert
        assert_eq!(s.history.alert_count().await, 1);
    }

    #[tokio::test]
    async fn test_daily_report_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[("https://wishesvideo.com", GOOD_PAGE)], AppConfig::default(), tmp.path());

        let outcome = s.trigger("daily").await.unwrap();
        let path = outcome.report_path.unwrap();
        let daily: DailyReport = s.store.load(&path).await.unwrap();
        assert_eq!(daily.report.summary.total_analyses, 1);
        assert_eq!(daily.checks.competitor_activity, 3);
    }

    #[tokio::test]
    async fn test_daily_mail_failure_keeps_run_successful() {
        let tmp = tempfile::tempdir().unwrap();
        // * A regular file where the outbox directory should be
        let blocked = tmp.path().join("outbox");
        std::fs::write(&blocked, "not a directory").unwrap();

        let mut config = AppConfig::default();
        config.automation.notifications.email = true;
        config.email = Some(EmailConfig {
            from: "seo@wishesvideo.com".to_string(),
            recipients: vec!["team@wishesvideo.com".to_string()],
            outbox_dir: blocked.join("mail"),
        });
        let s = scheduler(&[("https://wishesvideo.com", GOOD_PAGE)], config, tmp.path());

        let outcome = s.trigger("daily").await.unwrap();
        assert!(outcome.report_path.unwrap().exists());

        let status = s.status().await;
        assert_eq!(status.successful_runs, 1);
        assert!(status.errors.is_empty());
    }

    #[tokio::test]
    async fn test_keywords_unavailable_raise_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[], AppConfig::default(), tmp.path());

        let outcome = s.trigger("keywords").await.unwrap();
        assert_eq!(outcome.alerts_fired, 0);
        let rankings = s.history.rankings().await;
        assert_eq!(rankings.len(), 4);
        assert!(rankings.values().all(|r| r.position.is_none()));
    }

    #[tokio::test]
    async fn test_competitor_and_monthly() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[("https://vidblessings.com", GOOD_PAGE)], AppConfig::default(), tmp.path());

        let outcome = s.trigger("competitor").await.unwrap();
        assert_eq!(outcome.audited, 1);
        let report: CompetitorReport = s.store.load(&outcome.report_path.unwrap()).await.unwrap();
        assert_eq!(report.sites.len(), 3);

        let monthly = s.trigger("monthly").await.unwrap();
        let saved: MonthlyReport = s.store.load(&monthly.report_path.unwrap()).await.unwrap();
        assert_eq!(saved.system.total_runs, 1);
        assert_eq!(saved.retention.total(), 0);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let s = scheduler(&[], AppConfig::default(), tmp.path());

        let handle = s.start();
        assert_eq!(handle.task_count(), 6);
        assert!(s.is_running());

        handle.shutdown().await;
        assert!(!s.is_running());
        assert_eq!(s.status().await.total_runs, 0);
    }
}
