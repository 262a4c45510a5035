pub mod error;
pub mod executor;
pub mod job;
pub mod registry;
pub mod reload;
pub mod runner;
pub mod schedule;

pub use error::SchedulerError;
pub use executor::JobExecutor;
pub use job::{ExecutionOutcome, Job, RequestTemplate};
pub use registry::JobRegistry;
pub use reload::{reload_registry, ReloadSummary};
pub use runner::run_scheduler_loop;
pub use schedule::Schedule;
