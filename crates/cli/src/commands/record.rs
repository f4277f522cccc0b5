//! record CLI command.
//!
//! Solves the legs, then stores one pending bet per staked leg in the JSON
//! bet store. When bookmakers are configured, `book=` values may be given by
//! id or by name and are resolved to ids.

use anyhow::{bail, Result};
use clap::Args;
use rust_decimal::Decimal;
use surebet_core::{
    record_surebet, AccountPlan, AllocationEngine, AppConfig, BookmakerDirectory, JsonBetStore,
    Leg, StaticBookmakerDirectory, SurebetTicket,
};

use super::solve::{parse_leg, print_result};

/// Arguments for the record command.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Outcome leg, repeatable: ODD[:fixed=STAKE][:target][:book=ID]
    #[arg(long = "leg", required = true, value_parser = parse_leg)]
    pub legs: Vec<Leg>,

    /// Total investment, ignored when any leg has a fixed stake
    #[arg(long, default_value = "100")]
    pub total: Decimal,

    /// Bankroll the bets are drawn from
    #[arg(long)]
    pub bankroll: String,

    /// Sport id
    #[arg(long)]
    pub sport: String,

    /// Match or event description
    #[arg(long = "match")]
    pub match_description: String,

    /// Account recording the bets
    #[arg(long, env = "SUREBET_OWNER", default_value = "local")]
    pub owner: String,

    /// Bet store path (defaults to store.path from config)
    #[arg(long)]
    pub store: Option<String>,

    /// Bet limit for this account, replacing limits.default_bet_limit
    #[arg(long)]
    pub bet_limit: Option<u32>,
}

/// Runs the record command.
///
/// # Errors
/// Returns an error if a bookmaker is unknown, the ticket is invalid, the bet
/// limit is reached, or the store cannot be written.
pub async fn run_record(mut args: RecordArgs, config: &AppConfig) -> Result<()> {
    if !config.bookmakers.is_empty() {
        let directory = StaticBookmakerDirectory::new(config.bookmakers.clone());
        for (index, leg) in args.legs.iter_mut().enumerate() {
            let Some(key) = leg.bookmaker.clone() else {
                continue;
            };
            match directory.find(&key).await? {
                Some(bookmaker) => leg.bookmaker = Some(bookmaker.id),
                None => bail!("Unknown bookmaker '{}' on leg #{}", key, index + 1),
            }
        }
    }

    let engine = AllocationEngine::with_config(config.solver.clone());
    let result = engine.solve(&args.legs, args.total);
    print_result(&result);

    if !result.is_surebet {
        tracing::warn!(
            profit_pct = %result.overall_profit_percentage,
            "Recording a set of legs that is not a surebet"
        );
    }

    let store_path = args.store.unwrap_or_else(|| config.store.path.clone());
    let store = JsonBetStore::new(&store_path);
    let plan = AccountPlan {
        bet_limit_override: args.bet_limit,
        is_blocked: false,
    };
    let ticket = SurebetTicket::new(args.bankroll, args.sport, args.match_description);

    let bets = record_surebet(&store, &plan, &args.owner, &ticket, &result, &config.limits).await?;

    println!();
    println!("Recorded {} bet(s) in {}", bets.len(), store_path);
    for bet in &bets {
        println!(
            "  {}  {:<12} {:>10.2} @ {:.2}",
            bet.id, bet.bookie_id, bet.stake, bet.odds
        );
    }

    Ok(())
}
