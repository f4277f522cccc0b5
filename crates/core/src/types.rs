//! Input and output types for the allocation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;

// =============================================================================
// Leg
// =============================================================================

/// One betting outcome in an arbitrage set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Leg {
    /// Decimal odd. Zero means "not entered yet"; valid odds are > 1.
    pub odd: Decimal,
    /// Pinned stake. Only a positive value pins the leg.
    #[serde(default)]
    pub fixed_stake: Option<Decimal>,
    /// Member of the equal-profit group instead of the plain group.
    #[serde(default)]
    pub distribute_profit: bool,
    /// Opaque bookmaker id, carried for display and ticketing only.
    #[serde(default)]
    pub bookmaker: Option<String>,
}

impl Leg {
    /// Creates a plain, unfixed leg.
    #[must_use]
    pub fn new(odd: Decimal) -> Self {
        Self {
            odd,
            ..Self::default()
        }
    }

    /// Pins the stake for this leg.
    #[must_use]
    pub fn with_fixed_stake(mut self, stake: Decimal) -> Self {
        self.fixed_stake = Some(stake);
        self
    }

    /// Puts the leg in the target-profit group.
    #[must_use]
    pub fn distributing(mut self) -> Self {
        self.distribute_profit = true;
        self
    }

    #[must_use]
    pub fn with_bookmaker(mut self, bookmaker: impl Into<String>) -> Self {
        self.bookmaker = Some(bookmaker.into());
        self
    }

    /// The pinned stake, if it is positive.
    #[must_use]
    pub fn pinned_stake(&self) -> Option<Decimal> {
        self.fixed_stake.filter(|stake| *stake > Decimal::ZERO)
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.pinned_stake().is_some()
    }

    /// True when the odd can take part in a solve.
    #[must_use]
    pub fn is_priced(&self) -> bool {
        self.odd > Decimal::ONE
    }

    /// `1 / odd` for priced legs.
    #[must_use]
    pub fn implied_probability(&self) -> Option<Decimal> {
        self.is_priced().then(|| Decimal::ONE / self.odd)
    }

    /// Diagnostic describing why this leg is not priced, if it isn't.
    #[must_use]
    pub fn pricing_issue(&self, index: usize) -> Option<Diagnostic> {
        if self.is_priced() {
            None
        } else if self.odd == Decimal::ZERO {
            Some(Diagnostic::MissingOdds { leg: index })
        } else {
            Some(Diagnostic::InvalidOdds {
                leg: index,
                odd: self.odd,
            })
        }
    }
}

// =============================================================================
// Funding Mode
// =============================================================================

/// How a fixed-stake solve is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "anchor_kind", rename_all = "snake_case")]
pub enum FixedAnchor {
    /// The only fixed leg, which does not target profit. Its payout is the total stake.
    BreakEven { anchor: usize },
    /// Any other fixed configuration. The largest fixed payout is the reference.
    Reference,
}

/// Which quantity drives the solve. Derived from the legs, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FundingMode {
    /// No leg is fixed; the caller's total investment is distributed.
    TotalStakeDriven { total: Decimal },
    /// At least one leg is fixed; the total investment is an output.
    FixedStakeDriven(FixedAnchor),
}

impl FundingMode {
    /// Classifies a leg set.
    #[must_use]
    pub fn classify(legs: &[Leg], total_stake_input: Decimal) -> Self {
        let fixed: Vec<usize> = legs
            .iter()
            .enumerate()
            .filter(|(_, leg)| leg.is_fixed())
            .map(|(index, _)| index)
            .collect();

        if fixed.is_empty() {
            return Self::TotalStakeDriven {
                total: total_stake_input,
            };
        }

        match fixed.as_slice() {
            [anchor] if !legs[*anchor].distribute_profit => {
                Self::FixedStakeDriven(FixedAnchor::BreakEven { anchor: *anchor })
            }
            _ => Self::FixedStakeDriven(FixedAnchor::Reference),
        }
    }

    /// Whether the external total-stake field is read-only.
    #[must_use]
    pub fn locks_total(&self) -> bool {
        matches!(self, Self::FixedStakeDriven(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalStakeDriven { .. } => "total-stake",
            Self::FixedStakeDriven(FixedAnchor::BreakEven { .. }) => "break-even-anchor",
            Self::FixedStakeDriven(FixedAnchor::Reference) => "fixed-reference",
        }
    }
}

impl std::fmt::Display for FundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Results
// =============================================================================

/// A leg annotated with its solved stake and profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegAllocation {
    #[serde(flatten)]
    pub leg: Leg,
    /// Stake this leg must carry.
    pub calculated_stake: Decimal,
    /// Payout if this leg wins minus the total stake across all legs.
    pub potential_profit: Decimal,
}

impl LegAllocation {
    /// Gross return if this leg wins, saturating at the decimal range.
    #[must_use]
    pub fn payout(&self) -> Decimal {
        self.calculated_stake.saturating_mul(self.leg.odd)
    }
}

/// Output of one solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub legs: Vec<LegAllocation>,
    /// Resolved aggregate investment.
    pub total_stake: Decimal,
    pub overall_profit_percentage: Decimal,
    pub is_surebet: bool,
    pub funding_mode: Option<FundingMode>,
    /// True when the total is an output and the caller's total field must be read-only.
    pub total_stake_locked: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// Rendered diagnostics; empty when the solve is clean.
    pub diagnostic_message: String,
}

impl AllocationResult {
    /// A zeroed result for `legs`, used when nothing can be solved.
    #[must_use]
    pub fn zeroed(legs: &[Leg]) -> Self {
        Self {
            legs: legs
                .iter()
                .cloned()
                .map(|leg| LegAllocation {
                    leg,
                    calculated_stake: Decimal::ZERO,
                    potential_profit: Decimal::ZERO,
                })
                .collect(),
            total_stake: Decimal::ZERO,
            overall_profit_percentage: Decimal::ZERO,
            is_surebet: false,
            funding_mode: None,
            total_stake_locked: false,
            diagnostics: Vec::new(),
            diagnostic_message: String::new(),
        }
    }

    #[must_use]
    pub fn stakes(&self) -> Vec<Decimal> {
        self.legs.iter().map(|leg| leg.calculated_stake).collect()
    }

    #[must_use]
    pub fn profits(&self) -> Vec<Decimal> {
        self.legs.iter().map(|leg| leg.potential_profit).collect()
    }

    /// Smallest profit across legs, i.e. the guaranteed outcome.
    #[must_use]
    pub fn guaranteed_profit(&self) -> Decimal {
        self.legs
            .iter()
            .map(|leg| leg.potential_profit)
            .min()
            .unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
