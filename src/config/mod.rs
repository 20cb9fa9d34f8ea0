pub mod constants;
pub mod settings;

pub use settings::{
    AppConfig, AutomationConfig, BatchConfig, ConfigError, EmailConfig, FetchConfig,
    MonitoringConfig, NotificationConfig, RetentionConfig, ScheduleConfig, ServerConfig,
};
