// * Automation: scheduled audits, reports, ranking checks and retention

pub mod scheduler;

pub use scheduler::{
    ScheduledTask, Scheduler, SchedulerError, SchedulerHandle, SystemStatus, TaskError, TaskOutcome,
};
