// * Report store - JSON files under the data directory
// * reports/{daily,weekly,monthly,analyses,batches}, data/raw, alerts, logs

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::RetentionConfig;

const SECS_PER_DAY: u64 = 86_400;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a stored document is; decides directory and file prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Daily,
    Weekly,
    Monthly,
    Analysis,
    Batch,
    Keywords,
    Competitor,
    Alerts,
    /// Failed scheduler runs
    Error,
}

impl ReportKind {
    pub const ALL: [ReportKind; 9] = [
        ReportKind::Daily,
        ReportKind::Weekly,
        ReportKind::Monthly,
        ReportKind::Analysis,
        ReportKind::Batch,
        ReportKind::Keywords,
        ReportKind::Competitor,
        ReportKind::Alerts,
        ReportKind::Error,
    ];

    /// Directory relative to the store root
    pub fn dir(&self) -> &'static str {
        match self {
            ReportKind::Daily => "reports/daily",
            ReportKind::Weekly => "reports/weekly",
            ReportKind::Monthly => "reports/monthly",
            ReportKind::Analysis => "reports/analyses",
            ReportKind::Batch => "reports/batches",
            ReportKind::Keywords | ReportKind::Competitor => "data/raw",
            ReportKind::Alerts => "alerts",
            ReportKind::Error => "logs",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily-report",
            ReportKind::Weekly => "weekly-report",
            ReportKind::Monthly => "monthly-report",
            ReportKind::Analysis => "seo-analysis",
            ReportKind::Batch => "batch-analysis",
            ReportKind::Keywords => "keywords",
            ReportKind::Competitor => "competitor",
            ReportKind::Alerts => "alerts",
            ReportKind::Error => "error",
        }
    }
}

/// Files removed by one retention pass, per window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionSummary {
    pub reports: usize,
    pub raw_data: usize,
    pub alerts: usize,
}

impl RetentionSummary {
    pub fn total(&self) -> usize {
        self.reports + self.raw_data + self.alerts
    }
}

/// Filesystem-backed store for reports, raw data and alert logs
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: ReportKind) -> PathBuf {
        self.root.join(kind.dir())
    }

    /// Creates the whole directory tree
    pub async fn init(&self) -> Result<(), StoreError> {
        for dir in ReportKind::ALL.iter().map(|k| self.dir(*k)) {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;
        }
        tracing::debug!(root = %self.root.display(), "Report store initialized");
        Ok(())
    }

    /// Saves `value` as pretty JSON; returns the file path
    pub async fn save<T: Serialize>(&self, kind: ReportKind, value: &T) -> Result<PathBuf, StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        self.save_text(kind, "json", &json).await
    }

    /// Saves pre-rendered content (HTML, CSV) with the given extension
    pub async fn save_text(&self, kind: ReportKind, extension: &str, content: &str) -> Result<PathBuf, StoreError> {
        let dir = self.dir(kind);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ").to_string();
        let (path, mut file) = create_unique(&dir, kind.prefix(), &stamp, extension).await?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;

        tracing::info!(kind = kind.prefix(), path = %path.display(), "Report saved");
        Ok(path)
    }

    pub async fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Stored files of one kind, oldest first (names sort by timestamp)
    pub async fn list(&self, kind: ReportKind) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.dir(kind);
        let prefix = format!("{}-", kind.prefix());
        let mut files: Vec<PathBuf> = list_files(&dir)
            .await?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Most recent JSON document of one kind
    pub async fn latest<T: DeserializeOwned>(&self, kind: ReportKind) -> Result<Option<T>, StoreError> {
        let latest = self
            .list(kind)
            .await?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "json"))
            .last();
        match latest {
            Some(path) => Ok(Some(self.load(&path).await?)),
            None => Ok(None),
        }
    }

    /// Deletes every file in `dir` last modified more than `max_age` ago
    pub async fn cleanup(&self, dir: &Path, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        cleanup_before(dir, cutoff).await
    }

    /// Applies the three retention windows to their directories
    pub async fn apply_retention(&self, retention: &RetentionConfig) -> Result<RetentionSummary, StoreError> {
        let days = |d: u64| Duration::from_secs(d * SECS_PER_DAY);
        let mut summary = RetentionSummary::default();

        for kind in [
            ReportKind::Daily,
            ReportKind::Weekly,
            ReportKind::Monthly,
            ReportKind::Analysis,
            ReportKind::Batch,
        ] {
            summary.reports += self.cleanup(&self.dir(kind), days(retention.reports)).await?;
        }
        summary.raw_data = self
            .cleanup(&self.dir(ReportKind::Keywords), days(retention.raw_data))
            .await?;
        summary.alerts = self
            .cleanup(&self.dir(ReportKind::Alerts), days(retention.alerts))
            .await?;

        tracing::info!(
            reports = summary.reports,
            raw_data = summary.raw_data,
            alerts = summary.alerts,
            "Retention cleanup finished"
        );
        Ok(summary)
    }
}

/// Creates `<prefix>-<stamp>.<ext>` exclusively, or `<prefix>-<stamp>_NNN.<ext>` when taken.
/// The `_` suffix sorts after the bare name, so later saves list later.
async fn create_unique(
    dir: &Path,
    prefix: &str,
    stamp: &str,
    extension: &str,
) -> Result<(PathBuf, tokio::fs::File), StoreError> {
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("{}-{}.{}", prefix, stamp, extension),
            n => format!("{}-{}_{:03}.{}", prefix, stamp, n, extension),
        };
        let path = dir.join(name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(StoreError::io(&path, e)),
        }
    }
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::io(dir, e))? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Deletes files in `dir` modified before `cutoff`. A missing directory removes nothing.
pub async fn cleanup_before(dir: &Path, cutoff: SystemTime) -> Result<usize, StoreError> {
    let mut removed = 0;
    for path in list_files(dir).await? {
        let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read file age, skipping");
                continue;
            }
        };
        if modified < cutoff {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!(dir = %dir.display(), removed, "Old files removed");
    }
    Ok(removed)
}
