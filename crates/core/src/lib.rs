pub mod allocation;
pub mod config;
pub mod config_loader;
pub mod diagnostics;
pub mod settlement;
pub mod store;
pub mod ticket;
pub mod traits;
pub mod types;

pub use allocation::{solve, AllocationEngine};
pub use config::{AppConfig, Bookmaker, LimitsConfig, SolverConfig, StoreConfig};
pub use config_loader::ConfigLoader;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use settlement::{
    group_by_month, settle_recorded_bet, settled_profit, BankrollStats, Bet, BetStatus, BetType,
    DaySummary, MonthSummary, SettleError,
};
pub use store::{JsonBetStore, StaticBookmakerDirectory, StoreError};
pub use ticket::{record_surebet, AccountPlan, SurebetTicket, TicketError, TicketIssue};
pub use traits::{BetRepository, BookmakerDirectory};
pub use types::{AllocationResult, FixedAnchor, FundingMode, Leg, LegAllocation};
