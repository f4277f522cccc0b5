//! solve CLI command.
//!
//! Legs are given as `ODD[:fixed=STAKE][:target][:book=ID]`:
//!
//! ```bash
//! surebet solve --leg 2.1 --leg 2.1 --total 100
//! surebet solve --leg 2.0:fixed=50 --leg 3.4 --leg 4.2:target
//! ```

use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use surebet_core::{AllocationEngine, AllocationResult, AppConfig, Leg};

/// Arguments for the solve command.
#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Outcome leg, repeatable: ODD[:fixed=STAKE][:target][:book=ID]
    #[arg(long = "leg", required = true, value_parser = parse_leg)]
    pub legs: Vec<Leg>,

    /// Total investment, ignored when any leg has a fixed stake
    #[arg(long, default_value = "100")]
    pub total: Decimal,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parses one `--leg` value.
///
/// A comma is accepted as the decimal separator.
pub fn parse_leg(s: &str) -> Result<Leg, String> {
    let mut parts = s.split(':');
    let odd_text = parts.next().unwrap_or_default().trim();
    let mut leg = Leg::new(parse_amount(odd_text).map_err(|e| format!("odd: {e}"))?);

    for part in parts {
        let part = part.trim();
        match part.split_once('=') {
            Some(("fixed", stake)) => {
                leg.fixed_stake =
                    Some(parse_amount(stake).map_err(|e| format!("fixed stake: {e}"))?);
            }
            Some(("book", id)) if !id.trim().is_empty() => {
                leg.bookmaker = Some(id.trim().to_string());
            }
            None if part == "target" => leg.distribute_profit = true,
            _ => {
                return Err(format!(
                    "unknown leg option '{part}'. Valid options: fixed=STAKE, target, book=ID"
                ))
            }
        }
    }

    Ok(leg)
}

fn parse_amount(text: &str) -> Result<Decimal, String> {
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&text.replace(',', ".")).map_err(|_| format!("'{text}' is not a number"))
}

/// Runs the solve command.
///
/// # Errors
/// Returns an error only if JSON rendering fails.
pub fn run_solve(args: SolveArgs, config: &AppConfig) -> Result<()> {
    let result = solve_args(&args, config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn solve_args(args: &SolveArgs, config: &AppConfig) -> AllocationResult {
    AllocationEngine::with_config(config.solver.clone()).solve(&args.legs, args.total)
}

/// Prints a solve as a table.
pub fn print_result(result: &AllocationResult) {
    println!(
        "{:<4} {:>8} {:>10} {:>10}  {:<6} {:<6} {}",
        "LEG", "ODD", "STAKE", "PROFIT", "FIXED", "TARGET", "BOOK"
    );
    for (index, leg) in result.legs.iter().enumerate() {
        println!(
            "#{:<3} {:>8.2} {:>10.2} {:>10.2}  {:<6} {:<6} {}",
            index + 1,
            leg.leg.odd,
            leg.calculated_stake,
            leg.potential_profit,
            if leg.leg.is_fixed() { "yes" } else { "" },
            if leg.leg.distribute_profit { "yes" } else { "" },
            leg.leg.bookmaker.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!(
        "Total stake: {:.2}{}",
        result.total_stake,
        if result.total_stake_locked {
            " (set by fixed stakes)"
        } else {
            ""
        }
    );
    if let Some(mode) = result.funding_mode {
        println!("Mode:        {mode}");
    }
    println!("Profit:      {:.2}%", result.overall_profit_percentage);
    println!(
        "Surebet:     {}",
        if result.is_surebet { "YES" } else { "NO" }
    );
    if !result.diagnostic_message.is_empty() {
        println!();
        println!("{}", result.diagnostic_message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_leg() {
        assert_eq!(parse_leg("2.1").unwrap(), Leg::new(dec!(2.1)));
    }

    #[test]
    fn test_parse_all_options() {
        let leg = parse_leg("3,40:fixed=25:target:book=bk-7").unwrap();
        assert_eq!(leg.odd, dec!(3.40));
        assert_eq!(leg.fixed_stake, Some(dec!(25)));
        assert!(leg.distribute_profit);
        assert_eq!(leg.bookmaker.as_deref(), Some("bk-7"));
    }

    #[test]
    fn test_parse_empty_odd_is_missing() {
        assert_eq!(parse_leg(":target").unwrap().odd, Decimal::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_leg("abc").is_err());
        assert!(parse_leg("2.1:fixed=x").is_err());
        assert!(parse_leg("2.1:boost").is_err());
        assert!(parse_leg("2.1:book=").is_err());
    }

    #[test]
    fn test_solve_args_splits_even_odds() {
        let args = SolveArgs {
            legs: vec![Leg::new(dec!(2.1)), Leg::new(dec!(2.1))],
            total: dec!(100),
            json: true,
        };
        let result = solve_args(&args, &AppConfig::default());

        assert!(result.is_surebet);
        assert_eq!(result.total_stake, dec!(100));
        for leg in &result.legs {
            assert_eq!(leg.calculated_stake.round_dp(2), dec!(50));
            assert_eq!(leg.potential_profit.round_dp(2), dec!(5));
        }
        assert_eq!(result.overall_profit_percentage.round_dp(2), dec!(5));
    }
}
