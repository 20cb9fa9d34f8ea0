// * Site auditor
// * Fetch -> score for single pages, polite bounded fan-out for whole sites

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::engine::discovery::discover_urls;
use crate::engine::politeness::PolitenessManager;
use crate::engine::scorer::{analyze, PageAnalysis, Recommendation};
use crate::network::{FetchError, PageSource};
use crate::ops::telemetry;

// * How many issue types the batch summary keeps
const COMMON_ISSUES_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Success,
    Failed,
    /// Disallowed by robots.txt
    Skipped,
}

/// One URL of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPage {
    pub url: String,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub average_score: u8,
    pub total_issues: usize,
    /// Most frequent recommendation types, most common first
    pub common_issues: Vec<IssueCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    pub total_urls: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pages: Vec<BatchPage>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn analyses(&self) -> impl Iterator<Item = &PageAnalysis> {
        self.pages.iter().filter_map(|p| p.analysis.as_ref())
    }
}

/// Ties a page source to the scorer
pub struct SiteAuditor {
    source: Arc<dyn PageSource>,
    politeness: PolitenessManager,
    batch: BatchConfig,
}

impl std::fmt::Debug for SiteAuditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteAuditor")
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

impl SiteAuditor {
    pub fn new(source: Arc<dyn PageSource>, robots_token: &str, batch: BatchConfig) -> Self {
        Self {
            politeness: PolitenessManager::new(robots_token, batch.requests_per_second),
            source,
            batch,
        }
    }

    pub fn source(&self) -> &dyn PageSource {
        self.source.as_ref()
    }

    /// Fetches and scores one page. Fetch failures propagate; nothing is scored.
    pub async fn audit_url(&self, url: &str) -> Result<PageAnalysis, FetchError> {
        match self.source.fetch_page(url).await {
            Ok(page) => {
                let mut analysis = analyze(&page.body, url);
                analysis.load_time_ms = Some(page.elapsed_ms);
                telemetry::record_audit_success(analysis.score);
                info!(url = %url, score = analysis.score, load_time_ms = page.elapsed_ms, "Page audited");
                Ok(analysis)
            }
            Err(e) => {
                telemetry::record_audit_failure();
                warn!(url = %url, error = %e, "Audit fetch failed");
                Err(e)
            }
        }
    }

    /// Scores caller-supplied HTML without fetching
    pub fn audit_html(&self, url: &str, html: &str) -> PageAnalysis {
        let analysis = analyze(html, url);
        telemetry::record_audit_success(analysis.score);
        analysis
    }

    async fn audit_politely(&self, url: String) -> BatchPage {
        if let Some(policy) = self.politeness.policy_for(self.source.as_ref(), &url).await {
            if !policy.is_allowed(&url) {
                telemetry::record_audit_skipped();
                info!(url = %url, "Skipped, disallowed by robots.txt");
                return BatchPage {
                    url,
                    status: PageStatus::Skipped,
                    analysis: None,
                    error: Some("Disallowed by robots.txt".to_string()),
                };
            }
            policy.wait().await;
        }

        match self.audit_url(&url).await {
            Ok(analysis) => BatchPage {
                url,
                status: PageStatus::Success,
                analysis: Some(analysis),
                error: None,
            },
            Err(e) => BatchPage {
                url,
                status: PageStatus::Failed,
                analysis: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Audits a site: given URLs or discovered ones, `batch.size` at a time.
    pub async fn audit_batch(&self, domain: &str, urls: Option<Vec<String>>) -> BatchReport {
        let urls = match urls {
            Some(urls) if !urls.is_empty() => urls,
            _ => discover_urls(self.source.as_ref(), domain).await,
        };
        let chunk_size = self.batch.size.max(1);
        let pause = Duration::from_millis(self.batch.pause_ms);

        info!(domain = %domain, total = urls.len(), chunk_size, "Batch audit started");

        let mut pages = Vec::with_capacity(urls.len());
        let chunks: Vec<&[String]> = urls.chunks(chunk_size).collect();
        let chunk_count = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let results = join_all(chunk.iter().map(|url| self.audit_politely(url.clone()))).await;
            pages.extend(results);

            if i + 1 < chunk_count && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let report = build_report(domain, urls.len(), pages);
        info!(
            domain = %domain,
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            average_score = report.summary.average_score,
            "Batch audit finished"
        );
        report
    }
}

fn build_report(domain: &str, total_urls: usize, pages: Vec<BatchPage>) -> BatchReport {
    let count = |status| pages.iter().filter(|p| p.status == status).count();
    let processed = count(PageStatus::Success);
    let failed = count(PageStatus::Failed);
    let skipped = count(PageStatus::Skipped);

    let analyses: Vec<&PageAnalysis> = pages.iter().filter_map(|p| p.analysis.as_ref()).collect();
    let summary = summarize(&analyses);

    BatchReport {
        domain: domain.to_string(),
        timestamp: Utc::now(),
        total_urls,
        processed,
        failed,
        skipped,
        pages,
        summary,
    }
}

/// Average score, issue total and the most common issue types
pub fn summarize(analyses: &[&PageAnalysis]) -> BatchSummary {
    if analyses.is_empty() {
        return BatchSummary::default();
    }

    let total_score: u32 = analyses.iter().map(|a| u32::from(a.score)).sum();
    let average_score = (f64::from(total_score) / analyses.len() as f64).round() as u8;
    let total_issues = analyses.iter().map(|a| a.issues.len()).sum();

    let mut by_type: HashMap<&'static str, usize> = HashMap::new();
    for rec in analyses.iter().flat_map(|a| a.recommendations.iter()) {
        *by_type.entry(rec_type(rec)).or_default() += 1;
    }
    let mut common_issues: Vec<IssueCount> = by_type
        .into_iter()
        .map(|(kind, count)| IssueCount {
            kind: kind.to_string(),
            count,
        })
        .collect();
    common_issues.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
    common_issues.truncate(COMMON_ISSUES_LIMIT);

    BatchSummary {
        average_score,
        total_issues,
        common_issues,
    }
}

fn rec_type(rec: &Recommendation) -> &'static str {
    rec.kind.as_str()
}
