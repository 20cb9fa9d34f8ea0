// * The Engine: scoring, fetching policy and site audits

pub mod auditor;
pub mod discovery;
pub mod fingerprint;
pub mod normalization;
pub mod politeness;
pub mod scorer;

// * Re-exports for convenient access
pub use auditor::{BatchPage, BatchReport, BatchSummary, IssueCount, PageStatus, SiteAuditor};
pub use scorer::{analyze, PageAnalysis, Priority, Recommendation, RecommendationType, ScoreBreakdown};
