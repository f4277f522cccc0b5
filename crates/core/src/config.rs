use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub solver: SolverConfig,
    pub limits: LimitsConfig,
    pub store: StoreConfig,
    pub bookmakers: Vec<Bookmaker>,
}

/// Tolerances used by the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// A leg counts as non-losing when its profit is at least `-surebet_floor`.
    pub surebet_floor: Decimal,
    /// Absolute floor of the spread tolerance for "equalized" profits.
    pub equalization_floor: Decimal,
    /// Spread tolerance as a fraction of total stake.
    pub equalization_ratio: Decimal,
    /// Relative deviation of free stakes from their budget that triggers a rescale.
    pub adjustment_tolerance: Decimal,
    /// Absolute mismatch allowed between a fixed stake and the stake it must equal.
    pub conflict_tolerance: Decimal,
    /// Profits above this count as positive; percentages below it report as zero.
    pub positive_profit_threshold: Decimal,
    /// Arithmetic residues below this are reported as exactly zero.
    pub zero_snap: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            surebet_floor: Decimal::new(1, 2),          // 0.01
            equalization_floor: Decimal::new(15, 3),    // 0.015
            equalization_ratio: Decimal::new(15, 5),    // 0.00015
            adjustment_tolerance: Decimal::new(1, 2),   // 1% of budget
            conflict_tolerance: Decimal::new(1, 2),     // 0.01
            positive_profit_threshold: Decimal::new(5, 3), // 0.005
            zero_snap: Decimal::new(1, 12),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bets an account may hold unless it carries an override.
    pub default_bet_limit: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_bet_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "data/bets.json".to_string(),
        }
    }
}

/// Bookmaker entry used to label legs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bookmaker {
    pub id: String,
    pub name: String,
}
