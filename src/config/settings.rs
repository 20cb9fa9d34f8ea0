// * Application settings
// * JSON file -> defaults -> environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::constants::{
    BATCH_PAUSE_MS, BATCH_SIZE, DEFAULT_USER_AGENT, FETCH_TIMEOUT_SECS, HISTORY_CAPACITY,
    REQUESTS_PER_SECOND, RETENTION_ALERTS_DAYS, RETENTION_RAW_DAYS, RETENTION_REPORTS_DAYS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Top-level configuration for the whole toolkit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Domain of the monitored site (no scheme)
    pub target_website: String,
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub monitoring: MonitoringConfig,
    pub automation: AutomationConfig,
    pub email: Option<EmailConfig>,
    pub webhook_url: Option<String>,
    /// Root of the report/alert directory tree
    pub data_dir: PathBuf,
    pub history_capacity: usize,
    pub batch: BatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_website: "wishesvideo.com".to_string(),
            server: ServerConfig::default(),
            fetch: FetchConfig::default(),
            monitoring: MonitoringConfig::default(),
            automation: AutomationConfig::default(),
            email: None,
            webhook_url: None,
            data_dir: PathBuf::from("seo-data"),
            history_capacity: HISTORY_CAPACITY,
            batch: BatchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What the scheduler watches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringConfig {
    /// Pages audited on every scheduled check; empty means the site root only
    pub urls: Vec<String>,
    pub keywords: Vec<String>,
    /// Competitor domains (no scheme)
    pub competitors: Vec<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            keywords: vec![
                "personalized video messages".to_string(),
                "custom greeting videos".to_string(),
                "african video greetings".to_string(),
                "birthday video messages".to_string(),
            ],
            competitors: vec![
                "vidblessings.com".to_string(),
                "wishesmadevisual.com".to_string(),
                "dancegreetingsafrica.com".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationConfig {
    pub enabled: bool,
    pub schedules: ScheduleConfig,
    pub notifications: NotificationConfig,
    pub data_retention: RetentionConfig,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedules: ScheduleConfig::default(),
            notifications: NotificationConfig::default(),
            data_retention: RetentionConfig::default(),
        }
    }
}

/// Task periods in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    pub hourly_check: u64,
    pub daily_report: u64,
    pub competitor_check: u64,
    pub keyword_check: u64,
    pub weekly_analysis: u64,
    pub monthly_report: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        const HOUR: u64 = 3_600;
        Self {
            hourly_check: HOUR,
            daily_report: 24 * HOUR,
            competitor_check: 4 * HOUR,
            keyword_check: 6 * HOUR,
            weekly_analysis: 7 * 24 * HOUR,
            monthly_report: 30 * 24 * HOUR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    pub console: bool,
    pub email: bool,
    pub webhook: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            console: true,
            email: false,
            webhook: false,
        }
    }
}

/// Retention windows in days
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetentionConfig {
    pub reports: u64,
    pub raw_data: u64,
    pub alerts: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            reports: RETENTION_REPORTS_DAYS,
            raw_data: RETENTION_RAW_DAYS,
            alerts: RETENTION_ALERTS_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    pub from: String,
    pub recipients: Vec<String>,
    /// Spool directory picked up by the site's mail relay
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("seo-data/outbox")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    pub size: usize,
    pub pause_ms: u64,
    pub requests_per_second: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: BATCH_SIZE,
            pause_ms: BATCH_PAUSE_MS,
            requests_per_second: REQUESTS_PER_SECOND,
        }
    }
}

impl AppConfig {
    /// Parses a JSON config file. Fields left out fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Loads the file if it exists, otherwise defaults; then applies env overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `SEO_*` overrides. The lookup is injected so tests don't touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SEO_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: "SEO_PORT", value: port })?;
        }
        if let Some(dir) = lookup("SEO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("SEO_WEBHOOK_URL") {
            self.webhook_url = Some(url);
            self.automation.notifications.webhook = true;
        }
        if let Some(site) = lookup("SEO_TARGET_WEBSITE") {
            self.target_website = site;
        }
        Ok(())
    }

    /// Home page of the monitored site
    pub fn site_root(&self) -> String {
        format!("https://{}", self.target_website.trim_end_matches('/'))
    }

    /// Pages the scheduler audits; falls back to the site root
    pub fn monitored_urls(&self) -> Vec<String> {
        if self.monitoring.urls.is_empty() {
            vec![self.site_root()]
        } else {
            self.monitoring.urls.clone()
        }
    }
}
