//! settle CLI command.
//!
//! Without `--bet` it prints the profit a bet would settle to. With `--bet`
//! it settles a recorded bet in the bet store and saves the result.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use surebet_core::{
    settle_recorded_bet, settled_profit, AppConfig, BetStatus, BetType, JsonBetStore,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum BetTypeArg {
    /// Bookmaker bet, no commission
    #[default]
    Simple,
    /// Exchange back bet
    Back,
    /// Exchange lay bet
    Lay,
}

impl From<BetTypeArg> for BetType {
    fn from(arg: BetTypeArg) -> Self {
        match arg {
            BetTypeArg::Simple => BetType::Simple,
            BetTypeArg::Back => BetType::Back,
            BetTypeArg::Lay => BetType::Lay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BetStatusArg {
    Pending,
    Won,
    Lost,
    Cashout,
}

impl From<BetStatusArg> for BetStatus {
    fn from(arg: BetStatusArg) -> Self {
        match arg {
            BetStatusArg::Pending => BetStatus::Pending,
            BetStatusArg::Won => BetStatus::Won,
            BetStatusArg::Lost => BetStatus::Lost,
            BetStatusArg::Cashout => BetStatus::Cashout,
        }
    }
}

/// Arguments for the settle command.
#[derive(Args, Debug, Clone)]
pub struct SettleArgs {
    /// Recorded bet to settle
    #[arg(long, conflicts_with_all = ["stake", "odds", "bet_type", "commission"])]
    pub bet: Option<Uuid>,

    /// Amount returned by the bookmaker, for `--status cashout`
    #[arg(long, requires = "bet")]
    pub cashout: Option<Decimal>,

    /// Bet store path (defaults to store.path from config)
    #[arg(long, requires = "bet")]
    pub store: Option<String>,

    #[arg(long, required_unless_present = "bet")]
    pub stake: Option<Decimal>,

    #[arg(long, required_unless_present = "bet")]
    pub odds: Option<Decimal>,

    #[arg(long, default_value = "simple", value_enum)]
    pub bet_type: BetTypeArg,

    #[arg(long, value_enum)]
    pub status: BetStatusArg,

    /// Exchange commission in percent (e.g. 5 for 5%)
    #[arg(long, default_value = "0")]
    pub commission: Decimal,
}

/// Profit of an unrecorded bet, plus the lay liability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quote {
    profit: Decimal,
    liability: Option<Decimal>,
}

fn quote(args: &SettleArgs) -> Result<Quote> {
    let stake = args.stake.context("--stake is required without --bet")?;
    let odds = args.odds.context("--odds is required without --bet")?;
    let bet_type = BetType::from(args.bet_type);
    let status = BetStatus::from(args.status);

    Ok(Quote {
        profit: settled_profit(stake, odds, bet_type, status, args.commission),
        liability: (bet_type == BetType::Lay).then(|| (odds - Decimal::ONE) * stake),
    })
}

/// Runs the settle command.
///
/// # Errors
/// Returns an error if stake or odds are missing without `--bet`, or if the
/// recorded bet cannot be settled or saved.
pub async fn run_settle(args: SettleArgs, config: &AppConfig) -> Result<()> {
    let status = BetStatus::from(args.status);

    if let Some(id) = args.bet {
        let store_path = args.store.unwrap_or_else(|| config.store.path.clone());
        let store = JsonBetStore::new(&store_path);
        let bet = settle_recorded_bet(&store, id, status, args.cashout).await?;
        println!(
            "Bet {} ({}) {}: profit {:.2}",
            bet.id, bet.match_description, bet.status, bet.profit
        );
        return Ok(());
    }

    let quote = quote(&args)?;
    println!("{} bet, {status}: profit {:.2}", BetType::from(args.bet_type), quote.profit);
    if let Some(liability) = quote.liability {
        println!("Liability: {liability:.2}");
    }
    if status == BetStatus::Cashout {
        println!("Record the bet and settle it with --bet and --cashout to book the returned amount.");
    }

    Ok(())
}
