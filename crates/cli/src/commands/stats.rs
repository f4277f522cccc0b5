//! stats CLI command.
//!
//! Reads the bet store and prints bankroll statistics followed by a
//! month-by-month history.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use surebet_core::{group_by_month, AppConfig, BankrollStats, Bet, JsonBetStore, MonthSummary};

/// Arguments for the stats command.
#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Initial bankroll amount
    #[arg(long)]
    pub initial: Decimal,

    /// Only count bets from this bankroll
    #[arg(long)]
    pub bankroll: Option<String>,

    /// Bet store path (defaults to store.path from config)
    #[arg(long)]
    pub store: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatsReport {
    stats: BankrollStats,
    months: Vec<MonthSummary>,
}

/// Runs the stats command.
///
/// # Errors
/// Returns an error if the store exists but cannot be read.
pub async fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<()> {
    let store_path = args.store.unwrap_or_else(|| config.store.path.clone());
    let bets: Vec<Bet> = JsonBetStore::new(&store_path)
        .all()
        .await?
        .into_iter()
        .filter(|bet| {
            args.bankroll
                .as_deref()
                .map_or(true, |bankroll| bet.bankroll_id == bankroll)
        })
        .collect();

    let report = StatsReport {
        stats: BankrollStats::from_bets(&bets, args.initial),
        months: group_by_month(&bets).into_values().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("Bets:        {}", stats.total_bets);
    println!("Staked:      {:.2}", stats.total_stake);
    println!("Profit:      {:.2}", stats.total_profit);
    println!("ROI:         {:.2}%", stats.roi);
    println!("Progress:    {:.2}%", stats.progress);
    println!("Bankroll:    {:.2}", stats.current_amount);

    for month in &report.months {
        println!();
        println!("{}  {:>10.2}", month.month, month.total_profit);
        for day in month.days.values() {
            println!(
                "  {}  {:>3} bet(s) {:>10.2}",
                day.date,
                day.bets.len(),
                day.profit
            );
        }
    }

    Ok(())
}
