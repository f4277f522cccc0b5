//! Diagnostics reported by the allocation engine.
//!
//! The solver never fails. Every degenerate or infeasible input still produces
//! numbers, and the reason is attached as one or more [`Diagnostic`] entries
//! which render into a single human-readable message.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-fatal condition found while solving. Leg indices are zero-based and
/// rendered one-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Fewer than two outcomes were supplied.
    #[error("Add at least 2 outcomes ({count} supplied).")]
    InsufficientLegs { count: usize },

    /// An odd was entered but is not strictly greater than 1.
    #[error("Leg #{} odd {odd} must be greater than 1.", .leg + 1)]
    InvalidOdds { leg: usize, odd: Decimal },

    /// A leg that needs to be priced has no odd yet.
    #[error("Leg #{} has no odd.", .leg + 1)]
    MissingOdds { leg: usize },

    /// Stake-driven mode needs a positive total investment.
    #[error("Total investment must be greater than zero.")]
    NonPositiveTotal,

    /// The equalized solution cannot produce a positive profit.
    #[error("Negative surebet: implied probabilities sum to {book:.4}, no positive profit is possible.")]
    NegativeSurebet { book: Decimal },

    /// A fixed stake pays out less than the reference fixed leg.
    #[error(
        "Conflict: leg #{} has fixed stake {fixed:.2} but needs {required:.2} to match the payout of leg #{}.",
        .leg + 1,
        .anchor + 1
    )]
    FixedStakeConflict {
        leg: usize,
        anchor: usize,
        fixed: Decimal,
        required: Decimal,
    },

    /// Not enough budget is left to keep every plain leg at break-even.
    #[error("Insufficient stake: {available:.2} available but {required:.2} required to keep plain legs at break-even.")]
    InfeasibleAllocation { available: Decimal, required: Decimal },

    /// Free plain legs cannot all break even against a fixed reference.
    #[error("Free legs without target profit imply probabilities summing to {book:.4}; no total keeps them at break-even.")]
    BreakEvenUnreachable { book: Decimal },

    /// A stake computed negative and was clamped to zero.
    #[error("Leg #{} stake computed negative and was set to zero.", .leg + 1)]
    NegativeStakeClamped { leg: usize },

    /// An amount grew past what a decimal can hold; nothing was staked.
    #[error("Amounts are too large to calculate. Lower the odds or stakes.")]
    AmountOutOfRange,

    /// Free stakes were rescaled to match the requested budget exactly.
    #[error("Adjustment applied: stakes rescaled by {factor:.4} to match the total investment.")]
    AdjustmentApplied { factor: Decimal },
}

impl Diagnostic {
    /// Returns true for entries that only inform and do not indicate a problem.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::AdjustmentApplied { .. })
    }
}

/// Ordered, de-duplicated collection of diagnostics for one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a diagnostic unless an identical one is already present.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.0.contains(&diagnostic) {
            tracing::debug!(%diagnostic, "allocation diagnostic");
            self.0.push(diagnostic);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Returns true if any entry matches the predicate.
    pub fn any(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.0.iter().any(predicate)
    }

    /// Space-separated rendering of every entry; empty when the solve is clean.
    #[must_use]
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_leg_numbers_render_one_based() {
        let diagnostic = Diagnostic::InvalidOdds {
            leg: 0,
            odd: dec!(0.9),
        };
        assert_eq!(diagnostic.to_string(), "Leg #1 odd 0.9 must be greater than 1.");
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::MissingOdds { leg: 1 });
        diagnostics.push(Diagnostic::MissingOdds { leg: 1 });
        diagnostics.push(Diagnostic::NonPositiveTotal);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.message(),
            "Leg #2 has no odd. Total investment must be greater than zero."
        );
    }

    #[test]
    fn test_empty_message_when_clean() {
        assert!(Diagnostics::new().message().is_empty());
    }

    #[test]
    fn test_adjustment_is_informational() {
        assert!(Diagnostic::AdjustmentApplied { factor: dec!(1.01) }.is_informational());
        assert!(!Diagnostic::NonPositiveTotal.is_informational());
    }

    #[test]
    fn test_conflict_message_formats_amounts() {
        let diagnostic = Diagnostic::FixedStakeConflict {
            leg: 2,
            anchor: 0,
            fixed: dec!(40),
            required: dec!(55),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Conflict: leg #3 has fixed stake 40.00 but needs 55.00 to match the payout of leg #1."
        );
    }
}
