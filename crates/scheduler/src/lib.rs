//! `scheduler` crate — the Automation Scheduler (§4.5): binds workflows to
//! cron, webhook, or on-demand triggers and drives runs through the
//! `engine` crate, recording results via `db`.

pub mod automation;
pub mod cron;
pub mod error;
pub mod scheduler;

pub use automation::TriggerSpec;
pub use error::SchedulerError;
pub use scheduler::AutomationScheduler;
