// Signal desk services: cooldown gates, signal boards, the scheduled clock,
// and the orchestrator with its timer runtime.

pub mod command;
pub mod cooldown;
pub mod crowd;
pub mod dashboard;
pub mod runtime;
pub mod schedule;
pub mod signals;

pub use dashboard::{Dashboard, DashboardEvent, DashboardSnapshot};
pub use runtime::{Clock, DashboardHandle, SystemClock, TokioClock};
