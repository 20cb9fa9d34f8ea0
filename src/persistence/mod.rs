// * Persistence: report files on disk, monitoring history in memory, report rendering

pub mod history;
pub mod report;
pub mod store;

// * Re-exports for convenient access
pub use history::{ContentQuality, MonitoringReport, MonitoringStore, QualityStatus, ReportSummary};
pub use report::{render, render_csv, render_html, render_monitoring_html, RenderError, ReportFormat};
pub use store::{ReportKind, ReportStore, RetentionSummary, StoreError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scorer::analyze;

    #[tokio::test]
    async fn test_history_to_saved_report() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        store.init().await.unwrap();

        let history = MonitoringStore::default();
        history
            .push_analysis(analyze("<title>Custom video greetings</title>", "https://wishesvideo.com/"))
            .await;

        let report = history.report().await;
        let path = store.save(ReportKind::Daily, &report).await.unwrap();
        let loaded: MonitoringReport = store.load(&path).await.unwrap();

        assert_eq!(loaded.summary.total_analyses, 1);
        assert_eq!(loaded.recent_analyses[0].url, "https://wishesvideo.com/");
    }

    #[tokio::test]
    async fn test_rendered_report_saved_with_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let analysis = analyze("<html></html>", "https://wishesvideo.com/");

        let csv = render(&[&analysis], ReportFormat::Csv).unwrap();
        let path = store
            .save_text(ReportKind::Analysis, ReportFormat::Csv.extension(), &csv)
            .await
            .unwrap();

        assert_eq!(path.extension().unwrap(), "csv");
        assert!(std::fs::read_to_string(path).unwrap().starts_with("\"URL\""));
    }
}
