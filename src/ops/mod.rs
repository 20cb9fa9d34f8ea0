// * Operations: telemetry, alerting and notification channels

pub mod alerting;
pub mod notify;
pub mod telemetry;

// * Re-exports for convenient access
pub use alerting::{Alert, AlertConfig, AlertHandler, AlertKind, AlertManager, AlertSeverity, LoggingHandler};
pub use notify::{MailSpoolHandler, NotifyError, WebhookHandler};
pub use telemetry::{get_metrics_string, init_tracing, init_tracing_pretty, StatsCollector};

use std::sync::Arc;

use crate::config::AppConfig;

/// Builds the alert manager from the notification settings
pub fn alert_manager_from_config(config: &AppConfig) -> AlertManager {
    let notifications = &config.automation.notifications;
    let mut manager = if notifications.console {
        AlertManager::new()
    } else {
        AlertManager::silent(AlertConfig::default())
    };

    if notifications.webhook {
        match &config.webhook_url {
            Some(url) => manager.add_handler(Arc::new(WebhookHandler::new(url.clone()))),
            None => tracing::warn!("Webhook notifications enabled without webhookUrl"),
        }
    }

    if notifications.email {
        match &config.email {
            Some(email) => manager.add_handler(Arc::new(MailSpoolHandler::new(email))),
            None => tracing::warn!("Email notifications enabled without email settings"),
        }
    }

    manager
}
