//! CLI commands for the surebet calculator.

pub mod record;
pub mod settle;
pub mod solve;
pub mod stats;

pub use record::{run_record, RecordArgs};
pub use settle::{run_settle, SettleArgs};
pub use solve::{run_solve, SolveArgs};
pub use stats::{run_stats, StatsArgs};
