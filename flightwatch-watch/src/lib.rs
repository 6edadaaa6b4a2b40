pub mod runner;
pub mod scheduler;
pub mod sweep;

pub use runner::{pick_cheapest, WatchRunner};
pub use scheduler::{cron_expression, Cadence, Job, ScheduleError, Scheduler, TokioScheduler};
pub use sweep::{SweepReport, WatchSweep};
