// * Notification channels beyond the console
// * Webhook: POST JSON. Mail: RFC 5322 files spooled for the site's relay.

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::config::EmailConfig;
use crate::generators::escape_xml;
use crate::ops::alerting::{Alert, AlertHandler};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected alert with HTTP {0}")]
    Rejected(u16),

    #[error("Mail spool write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Posts every alert as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookHandler {
    client: reqwest::Client,
    url: String,
}

impl WebhookHandler {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn payload(alert: &Alert) -> serde_json::Value {
        json!({
            "type": "seo_alert",
            "alert": alert,
            "timestamp": Utc::now(),
        })
    }
}

impl AlertHandler for WebhookHandler {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn handle(&self, alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = Self::payload(alert);
        Box::pin(async move {
            let resp = client.post(&url).json(&body).send().await?;
            if !resp.status().is_success() {
                return Err(NotifyError::Rejected(resp.status().as_u16()));
            }
            Ok(())
        })
    }
}

/// Writes each alert as an `.eml` file into an outbox directory
#[derive(Debug, Clone)]
pub struct MailSpoolHandler {
    from: String,
    recipients: Vec<String>,
    outbox: PathBuf,
}

impl MailSpoolHandler {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            from: config.from.clone(),
            recipients: config.recipients.clone(),
            outbox: config.outbox_dir.clone(),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    pub fn alert_subject(alert: &Alert) -> String {
        format!("[SEO Alert][{}] {}", alert.severity, alert.message)
    }

    pub fn alert_body(alert: &Alert) -> String {
        let mut rows = vec![
            ("Severity", alert.severity.to_string()),
            ("Type", alert.kind.to_string()),
            ("Metric", alert.metric.clone()),
            ("Value", format!("{}", alert.value)),
        ];
        if let Some(threshold) = alert.threshold {
            rows.push(("Threshold", format!("{}", threshold)));
        }
        if let Some(url) = &alert.url {
            rows.push(("URL", url.clone()));
        }
        rows.push(("Time", alert.timestamp.to_rfc3339()));

        let table = rows
            .iter()
            .map(|(k, v)| format!("<tr><th align=\"left\">{}</th><td>{}</td></tr>", k, escape_xml(v)))
            .collect::<String>();

        format!(
            "<html><body><h2>{}</h2><table>{}</table></body></html>",
            escape_xml(&alert.message),
            table
        )
    }

    /// Renders a complete message with headers
    pub fn render_message(&self, subject: &str, html_body: &str) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}\r\n",
            self.from,
            self.recipients.join(", "),
            subject.replace(['\r', '\n'], " "),
            Utc::now().to_rfc2822(),
            html_body
        )
    }

    /// Spools an arbitrary HTML message (reports use this too)
    pub async fn spool(&self, subject: &str, html_body: &str) -> Result<PathBuf, NotifyError> {
        static SEQ: AtomicU64 = AtomicU64::new(0);

        tokio::fs::create_dir_all(&self.outbox).await?;
        let name = format!(
            "{}-{}.eml",
            Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
            SEQ.fetch_add(1, Ordering::Relaxed)
        );
        let path = self.outbox.join(name);
        tokio::fs::write(&path, self.render_message(subject, html_body)).await?;
        tracing::debug!(path = %path.display(), "Mail spooled");
        Ok(path)
    }
}

impl AlertHandler for MailSpoolHandler {
    fn name(&self) -> &'static str {
        "email"
    }

    fn handle(&self, alert: &Alert) -> BoxFuture<'static, Result<(), NotifyError>> {
        let spool = self.clone();
        let subject = Self::alert_subject(alert);
        let body = Self::alert_body(alert);
        Box::pin(async move { spool.spool(&subject, &body).await.map(|_| ()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::alerting::{AlertKind, AlertSeverity};

    fn sample_alert() -> Alert {
        Alert::new(
            AlertSeverity::High,
            AlertKind::LowScore,
            "seo_score",
            42.0,
            "SEO score 42 is below 60",
        )
        .with_threshold(60.0)
        .with_url("https://wishesvideo.com/?a=<b>")
    }

    #[test]
    fn test_subject_and_body() {
        let alert = sample_alert();
        assert_eq!(
            MailSpoolHandler::alert_subject(&alert),
            "[SEO Alert][HIGH] SEO score 42 is below 60"
        );
        let body = MailSpoolHandler::alert_body(&alert);
        assert!(body.contains("Threshold"));
        assert!(body.contains("&lt;b&gt;"));
    }

    #[test]
    fn test_webhook_payload() {
        let payload = WebhookHandler::payload(&sample_alert());
        assert_eq!(payload["type"], "seo_alert");
        assert_eq!(payload["alert"]["kind"], "low_score");
    }

    #[tokio::test]
    async fn test_mail_spool_writes_eml() {
        let dir = tempfile::tempdir().unwrap();
        let handler = MailSpoolHandler::new(&EmailConfig {
            from: "seo@wishesvideo.com".to_string(),
            recipients: vec!["ops@wishesvideo.com".to_string(), "ceo@wishesvideo.com".to_string()],
            outbox_dir: dir.path().join("outbox"),
        });

        handler.handle(&sample_alert()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(handler.outbox()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("eml"));

        let message = std::fs::read_to_string(path).unwrap();
        assert!(message.contains("To: ops@wishesvideo.com, ceo@wishesvideo.com"));
        assert!(message.contains("Subject: [SEO Alert][HIGH]"));
        assert!(message.contains("Content-Type: text/html"));
    }
}
