//! Surebet stake allocation.
//!
//! Given a set of outcome legs and a funding mode, computes the stake each leg
//! must carry so every fixed-stake and profit-equalization constraint holds,
//! then classifies the result.
//!
//! # Funding modes
//!
//! ```text
//! TotalStakeDriven          total S is an input, every leg is free
//! FixedStakeDriven
//!   BreakEven { anchor }    anchor payout fixed * odd becomes the total stake
//!   Reference               largest fixed payout is the payout the free legs match
//! ```
//!
//! Inside any free group the legs split into two sets:
//!
//! - plain legs: with no target-profit legs present, the budget is spread in
//!   proportion to `1/odd` so every payout is equal; next to target-profit legs
//!   each plain leg gets `base / odd` and breaks even on the base payout.
//! - target-profit legs: share whatever budget remains so that every one of
//!   them pays `base + p` for a single uniform profit `p`.
//!
//! # Example
//! ```
//! use surebet_core::{solve, Leg};
//! use rust_decimal_macros::dec;
//!
//! let result = solve(&[Leg::new(dec!(2.1)), Leg::new(dec!(2.1))], dec!(100));
//!
//! assert!(result.is_surebet);
//! assert_eq!(result.legs[0].calculated_stake.round_dp(2), dec!(50));
//! assert_eq!(result.legs[0].potential_profit.round_dp(2), dec!(5));
//! ```

use rust_decimal::Decimal;

use crate::config::SolverConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::types::{AllocationResult, FixedAnchor, FundingMode, Leg, LegAllocation};

/// An intermediate amount left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Overflow;

type Step<T = ()> = Result<T, Overflow>;

fn mul(a: Decimal, b: Decimal) -> Step<Decimal> {
    a.checked_mul(b).ok_or(Overflow)
}

fn div(a: Decimal, b: Decimal) -> Step<Decimal> {
    a.checked_div(b).ok_or(Overflow)
}

fn sub(a: Decimal, b: Decimal) -> Step<Decimal> {
    a.checked_sub(b).ok_or(Overflow)
}

fn sum(mut values: impl Iterator<Item = Decimal>) -> Step<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value).ok_or(Overflow))
}

/// Stateless surebet solver.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    config: SolverConfig,
}

impl AllocationEngine {
    /// Creates an engine with default tolerances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves stakes for `legs`.
    ///
    /// `total_stake_input` is only read when no leg carries a fixed stake. The
    /// call never fails: infeasible or incomplete input yields zeroed or
    /// partial stakes together with diagnostics.
    #[must_use]
    pub fn solve(&self, legs: &[Leg], total_stake_input: Decimal) -> AllocationResult {
        if legs.len() < 2 {
            return Self::rejected(
                legs,
                None,
                Diagnostic::InsufficientLegs { count: legs.len() },
            );
        }

        let mode = FundingMode::classify(legs, total_stake_input);
        tracing::debug!(%mode, legs = legs.len(), "solving allocation");

        let mut solve = Solve::new(legs, &self.config);
        let funded = match mode {
            FundingMode::TotalStakeDriven { total } => solve.fund_total(total),
            FundingMode::FixedStakeDriven(FixedAnchor::BreakEven { anchor }) => {
                solve.fund_break_even(anchor)
            }
            FundingMode::FixedStakeDriven(FixedAnchor::Reference) => solve.fund_reference(),
        };

        let result = funded
            .and_then(|()| solve.finish(mode))
            .unwrap_or_else(|Overflow| {
                tracing::warn!(%mode, "allocation amounts out of range");
                Self::rejected(legs, Some(mode), Diagnostic::AmountOutOfRange)
            });

        tracing::debug!(
            total = %result.total_stake,
            is_surebet = result.is_surebet,
            profit_pct = %result.overall_profit_percentage,
            "allocation solved"
        );
        result
    }

    fn rejected(legs: &[Leg], mode: Option<FundingMode>, diagnostic: Diagnostic) -> AllocationResult {
        let mut result = AllocationResult::zeroed(legs);
        result.funding_mode = mode;
        result.total_stake_locked = mode.is_some_and(|mode| mode.locks_total());
        result.diagnostic_message = diagnostic.to_string();
        result.diagnostics = vec![diagnostic];
        result
    }
}

/// Solves with default tolerances.
#[must_use]
pub fn solve(legs: &[Leg], total_stake_input: Decimal) -> AllocationResult {
    AllocationEngine::new().solve(legs, total_stake_input)
}

/// Working state of a single solve.
struct Solve<'a> {
    legs: &'a [Leg],
    config: &'a SolverConfig,
    stakes: Vec<Decimal>,
    diagnostics: Diagnostics,
    /// Total imposed by an anchor instead of the sum of stakes.
    forced_total: Option<Decimal>,
    /// Break-even anchor whose profit is reported as zero.
    anchor: Option<usize>,
}

impl<'a> Solve<'a> {
    fn new(legs: &'a [Leg], config: &'a SolverConfig) -> Self {
        let mut diagnostics = Diagnostics::new();
        for (index, leg) in legs.iter().enumerate() {
            if leg.odd != Decimal::ZERO {
                if let Some(issue) = leg.pricing_issue(index) {
                    diagnostics.push(issue);
                }
            }
        }

        Self {
            legs,
            config,
            stakes: legs
                .iter()
                .map(|leg| leg.pinned_stake().unwrap_or(Decimal::ZERO))
                .collect(),
            diagnostics,
            forced_total: None,
            anchor: None,
        }
    }

    fn fixed_indices(&self) -> Vec<usize> {
        (0..self.legs.len())
            .filter(|&index| self.legs[index].is_fixed())
            .collect()
    }

    fn free_indices(&self) -> Vec<usize> {
        (0..self.legs.len())
            .filter(|&index| !self.legs[index].is_fixed())
            .collect()
    }

    /// Sum of implied probabilities over priced legs in `group`.
    fn book(&self, group: &[usize]) -> Decimal {
        group
            .iter()
            .filter_map(|&index| self.legs[index].implied_probability())
            .sum()
    }

    fn zero(&mut self, group: &[usize]) {
        for &index in group {
            self.stakes[index] = Decimal::ZERO;
        }
    }

    // -------------------------------------------------------------------------
    // Funding modes
    // -------------------------------------------------------------------------

    fn fund_total(&mut self, total: Decimal) -> Step {
        if total <= Decimal::ZERO {
            self.diagnostics.push(Diagnostic::NonPositiveTotal);
            return Ok(());
        }

        let free = self.free_indices();
        self.allocate_group(&free, total, total)
    }

    /// The anchor is the only fixed leg, so every other leg is free.
    fn fund_break_even(&mut self, anchor: usize) -> Step {
        let legs = self.legs;
        let anchor_leg = &legs[anchor];
        let anchor_stake = self.stakes[anchor];
        let free = self.free_indices();
        self.anchor = Some(anchor);

        if let Some(issue) = anchor_leg.pricing_issue(anchor) {
            self.diagnostics.push(issue);
            self.zero(&free);
            return Ok(());
        }

        let total = mul(anchor_stake, anchor_leg.odd)?;
        self.forced_total = Some(total);
        self.allocate_group(&free, sub(total, anchor_stake)?, total)
    }

    fn fund_reference(&mut self) -> Step {
        let fixed = self.fixed_indices();

        let mut reference: Option<(usize, Decimal)> = None;
        for &index in &fixed {
            let leg = &self.legs[index];
            match leg.pricing_issue(index) {
                Some(issue) => self.diagnostics.push(issue),
                None => {
                    let payout = mul(self.stakes[index], leg.odd)?;
                    if reference.map_or(true, |(_, best)| payout > best) {
                        reference = Some((index, payout));
                    }
                }
            }
        }

        if let Some((reference_leg, payout)) = reference {
            self.report_conflicts(&fixed, reference_leg, payout)?;
        }

        let (target, plain) = self.priced_partition(&self.free_indices());

        match reference {
            Some((_, payout)) => {
                for &index in &target {
                    self.stakes[index] = div(payout, self.legs[index].odd)?;
                }
            }
            None => self.zero(&target),
        }

        if plain.is_empty() {
            return Ok(());
        }

        let committed = sum(
            fixed
                .iter()
                .chain(target.iter())
                .map(|&index| self.stakes[index]),
        )?;
        let book = self.book(&plain);

        if book >= Decimal::ONE {
            self.diagnostics
                .push(Diagnostic::BreakEvenUnreachable { book });
            self.zero(&plain);
            return Ok(());
        }

        let total = div(committed, Decimal::ONE - book)?;
        for &index in &plain {
            self.stakes[index] = div(total, self.legs[index].odd)?;
        }
        Ok(())
    }

    /// Flags fixed legs whose payout falls short of the reference payout.
    fn report_conflicts(&mut self, fixed: &[usize], reference: usize, payout: Decimal) -> Step {
        for &index in fixed {
            let leg = &self.legs[index];
            if index == reference || !leg.is_priced() {
                continue;
            }

            let required = div(payout, leg.odd)?;
            let stake = self.stakes[index];
            if sub(required, stake)? > self.config.conflict_tolerance {
                self.diagnostics.push(Diagnostic::FixedStakeConflict {
                    leg: index,
                    anchor: reference,
                    fixed: stake,
                    required,
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Free-group allocation
    // -------------------------------------------------------------------------

    /// Splits free legs into (target-profit, plain), zeroing and reporting unpriced ones.
    fn priced_partition(&mut self, free: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let mut target = Vec::new();
        let mut plain = Vec::new();

        for &index in free {
            let leg = &self.legs[index];
            if let Some(issue) = leg.pricing_issue(index) {
                self.diagnostics.push(issue);
                self.stakes[index] = Decimal::ZERO;
            } else if leg.distribute_profit {
                target.push(index);
            } else {
                plain.push(index);
            }
        }

        (target, plain)
    }

    /// Distributes `budget` over the free legs so their payouts meet `base`.
    fn allocate_group(&mut self, free: &[usize], budget: Decimal, base: Decimal) -> Step {
        let (target, plain) = self.priced_partition(free);

        match (target.is_empty(), plain.is_empty()) {
            (true, true) => return Ok(()),
            (true, false) => self.equalize(&plain, budget, base, true)?,
            (false, true) => self.equalize(&target, budget, base, false)?,
            (false, false) => {
                let remaining = self.break_even(&plain, budget, base)?;
                if remaining > Decimal::ZERO {
                    self.equalize(&target, remaining, base, false)?;
                } else {
                    self.zero(&target);
                }
            }
        }

        let priced: Vec<usize> = target.into_iter().chain(plain).collect();
        self.rescale(&priced, budget)
    }

    /// Gives every leg in `group` the same payout `budget / book`.
    ///
    /// Flags a negative surebet when that payout falls below `base` (or
    /// merely reaches it, unless `tolerate_break_even`).
    fn equalize(
        &mut self,
        group: &[usize],
        budget: Decimal,
        base: Decimal,
        tolerate_break_even: bool,
    ) -> Step {
        let book = self.book(group);
        if book <= Decimal::ZERO || budget <= Decimal::ZERO {
            self.zero(group);
            return Ok(());
        }

        let payout = div(budget, book)?;
        let losing = if tolerate_break_even {
            payout < base
        } else {
            payout <= base
        };
        if losing {
            self.diagnostics.push(Diagnostic::NegativeSurebet {
                book: div(mul(base, book)?, budget)?,
            });
        }

        for &index in group {
            self.stakes[index] = div(payout, self.legs[index].odd)?;
        }
        Ok(())
    }

    /// Stakes each plain leg to return exactly `base`, in leg order, while
    /// budget lasts. Returns the budget left over.
    fn break_even(&mut self, plain: &[usize], budget: Decimal, base: Decimal) -> Step<Decimal> {
        let wanted: Vec<Decimal> = plain
            .iter()
            .map(|&index| div(base, self.legs[index].odd))
            .collect::<Step<_>>()?;
        let required = sum(wanted.iter().copied())?;
        let mut remaining = budget;

        for (&index, &stake) in plain.iter().zip(&wanted) {
            let granted = stake.min(remaining).max(Decimal::ZERO);
            self.stakes[index] = granted;
            remaining -= granted;
        }

        if required > budget {
            self.diagnostics.push(Diagnostic::InfeasibleAllocation {
                available: budget,
                required,
            });
        }

        Ok(remaining)
    }

    /// Rescales positive stakes in `group` to sum to `budget` when they drift
    /// beyond the adjustment tolerance.
    fn rescale(&mut self, group: &[usize], budget: Decimal) -> Step {
        if budget <= Decimal::ZERO {
            return Ok(());
        }

        let total = sum(group.iter().map(|&index| self.stakes[index]))?;
        if total <= Decimal::ZERO
            || sub(total, budget)?.abs() <= mul(self.config.adjustment_tolerance, budget)?
        {
            return Ok(());
        }

        let factor = div(budget, total)?;
        for &index in group {
            if self.stakes[index] > Decimal::ZERO {
                self.stakes[index] = mul(self.stakes[index], factor)?;
            }
        }
        self.diagnostics
            .push(Diagnostic::AdjustmentApplied { factor });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Profit and verdict
    // -------------------------------------------------------------------------

    fn snap(&self, value: Decimal) -> Decimal {
        if value.abs() < self.config.zero_snap {
            Decimal::ZERO
        } else {
            value
        }
    }

    fn clamp_negative_stakes(&mut self) {
        for index in 0..self.stakes.len() {
            if self.stakes[index] < Decimal::ZERO {
                self.stakes[index] = Decimal::ZERO;
                self.diagnostics
                    .push(Diagnostic::NegativeStakeClamped { leg: index });
            }
        }
    }

    fn spread_tolerance(&self, total: Decimal) -> Step<Decimal> {
        Ok(self
            .config
            .equalization_floor
            .max(mul(self.config.equalization_ratio, total)?))
    }

    /// True when the spread between `min` and `max` is inside the tolerance.
    fn equalized(&self, min: Decimal, max: Decimal, total: Decimal) -> Step<bool> {
        Ok(sub(max, min)? < self.spread_tolerance(total)?)
    }

    fn is_surebet(&self, profits: &[Decimal], total: Decimal) -> Step<bool> {
        if total <= Decimal::ZERO || profits.is_empty() {
            return Ok(false);
        }

        let floor = -self.config.surebet_floor;

        if let Some((min, max)) = min_max(profits.iter().copied()) {
            if min >= floor && self.equalized(min, max, total)? {
                return Ok(true);
            }
        }

        let target: Vec<Decimal> = profits
            .iter()
            .zip(self.legs)
            .filter(|(_, leg)| leg.distribute_profit)
            .map(|(profit, _)| *profit)
            .collect();
        let plain_ok = profits
            .iter()
            .zip(self.legs)
            .filter(|(_, leg)| !leg.distribute_profit)
            .all(|(profit, _)| *profit >= floor);

        match min_max(target.into_iter()) {
            Some((min, max)) => Ok(plain_ok && min >= floor && self.equalized(min, max, total)?),
            None => Ok(false),
        }
    }

    fn profit_percentage(
        &self,
        mode: FundingMode,
        profits: &[Decimal],
        total: Decimal,
        is_surebet: bool,
    ) -> Step<Decimal> {
        if total <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let threshold = self.config.positive_profit_threshold;
        let positive_min = |values: &[Decimal]| {
            values
                .iter()
                .copied()
                .filter(|profit| *profit > threshold)
                .min()
        };

        let ratio = if is_surebet {
            match positive_min(profits) {
                Some(min) => div(min, total)?,
                None => {
                    let floor = -self.config.surebet_floor;
                    let kept: Vec<Decimal> =
                        profits.iter().copied().filter(|p| *p >= floor).collect();
                    if kept.is_empty() {
                        Decimal::ZERO
                    } else {
                        let mean = div(sum(kept.iter().copied())?, Decimal::from(kept.len()))?;
                        div(mean.max(Decimal::ZERO), total)?
                    }
                }
            }
        } else {
            match mode {
                FundingMode::TotalStakeDriven { .. } => {
                    if self.legs.iter().all(Leg::is_priced) {
                        let all: Vec<usize> = (0..self.legs.len()).collect();
                        div(Decimal::ONE, self.book(&all))? - Decimal::ONE
                    } else {
                        Decimal::ZERO
                    }
                }
                FundingMode::FixedStakeDriven(_) => {
                    let relevant: Vec<Decimal> = profits
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| Some(*index) != self.anchor)
                        .map(|(_, profit)| *profit)
                        .collect();
                    match min_max(relevant.iter().copied()) {
                        None => Decimal::ZERO,
                        Some((min, max)) if self.equalized(min, max, total)? => div(min, total)?,
                        Some((min, _)) => {
                            div(positive_min(relevant.as_slice()).unwrap_or(min), total)?
                        }
                    }
                }
            }
        };

        let percentage = mul(ratio, Decimal::ONE_HUNDRED)?;
        if percentage.abs() < threshold {
            Ok(Decimal::ZERO)
        } else {
            Ok(percentage)
        }
    }

    fn finish(mut self, mode: FundingMode) -> Step<AllocationResult> {
        self.clamp_negative_stakes();

        let actual = sum(self.stakes.iter().copied())?;
        let total = self
            .forced_total
            .filter(|total| *total > Decimal::ZERO)
            .unwrap_or(actual);

        let profits: Vec<Decimal> = self
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| -> Step<Decimal> {
                if Some(index) == self.anchor {
                    return Ok(Decimal::ZERO);
                }
                let odd = if leg.is_priced() { leg.odd } else { Decimal::ZERO };
                Ok(self.snap(sub(mul(self.stakes[index], odd)?, total)?))
            })
            .collect::<Step<_>>()?;

        let is_surebet = self.is_surebet(&profits, total)?;
        let overall_profit_percentage =
            self.profit_percentage(mode, &profits, total, is_surebet)?;

        let legs = self
            .legs
            .iter()
            .cloned()
            .zip(self.stakes.iter().copied())
            .zip(profits)
            .map(|((leg, calculated_stake), potential_profit)| LegAllocation {
                leg,
                calculated_stake,
                potential_profit,
            })
            .collect();

        Ok(AllocationResult {
            legs,
            total_stake: total,
            overall_profit_percentage,
            is_surebet,
            funding_mode: Some(mode),
            total_stake_locked: mode.locks_total(),
            diagnostic_message: self.diagnostics.message(),
            diagnostics: self.diagnostics.into_vec(),
        })
    }
}

fn min_max(values: impl Iterator<Item = Decimal>) -> Option<(Decimal, Decimal)> {
    values.fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000001)
    }

    fn legs(odds: &[Decimal]) -> Vec<Leg> {
        odds.iter().copied().map(Leg::new).collect()
    }

    // =========================================================================
    // Leg-count floor and pricing
    // =========================================================================

    #[test]
    fn test_fewer_than_two_legs() {
        for input in [vec![], legs(&[dec!(2.5)])] {
            let result = solve(&input, dec!(100));
            assert_eq!(result.total_stake, Decimal::ZERO);
            assert!(!result.is_surebet);
            assert!(!result.diagnostic_message.is_empty());
            assert_eq!(
                result.diagnostics,
                vec![Diagnostic::InsufficientLegs { count: input.len() }]
            );
            assert_eq!(result.legs.len(), input.len());
        }
    }

    #[test]
    fn test_invalid_odd_leg_gets_no_stake() {
        let result = solve(&legs(&[dec!(0.8), dec!(2.5), dec!(2.5)]), dec!(100));

        assert_eq!(result.legs[0].calculated_stake, Decimal::ZERO);
        assert!(close(result.legs[1].calculated_stake, dec!(50)));
        assert!(close(result.legs[2].calculated_stake, dec!(50)));
        assert!(result.diagnostics.contains(&Diagnostic::InvalidOdds {
            leg: 0,
            odd: dec!(0.8)
        }));
        // Losing outcome 1 loses the whole total
        assert_eq!(result.legs[0].potential_profit, dec!(-100));
        assert!(!result.is_surebet);
        assert_eq!(result.overall_profit_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_missing_odd_is_reported() {
        let result = solve(&legs(&[dec!(0), dec!(2.5)]), dec!(100));
        assert!(result.diagnostics.contains(&Diagnostic::MissingOdds { leg: 0 }));
        assert_eq!(result.legs[0].calculated_stake, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_total() {
        let result = solve(&legs(&[dec!(2.1), dec!(2.1)]), dec!(0));
        assert_eq!(result.diagnostics, vec![Diagnostic::NonPositiveTotal]);
        assert_eq!(result.stakes(), vec![Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(result.total_stake, Decimal::ZERO);
        assert!(!result.total_stake_locked);
    }

    // =========================================================================
    // Total-stake driven
    // =========================================================================

    #[test]
    fn test_even_odds_surebet() {
        let result = solve(&legs(&[dec!(2.1), dec!(2.1)]), dec!(100));

        assert!(result.is_surebet);
        assert!(result.is_clean());
        assert!(close(result.total_stake, dec!(100)));
        for leg in &result.legs {
            assert!(close(leg.calculated_stake, dec!(50)));
            assert!(close(leg.payout(), dec!(105)));
            assert!(close(leg.potential_profit, dec!(5)));
        }
        assert!(close(result.overall_profit_percentage, dec!(5)));
    }

    #[test]
    fn test_proportional_payouts_are_equal() {
        let odds = [dec!(2.5), dec!(3.4), dec!(4.2)];
        let result = solve(&legs(&odds), dec!(250));

        let book: Decimal = odds.iter().map(|odd| Decimal::ONE / odd).sum();
        let expected = dec!(250) / book;
        for leg in &result.legs {
            assert!(close(leg.payout(), expected));
        }
        let sum: Decimal = result.stakes().iter().copied().sum();
        assert!(close(sum, dec!(250)));
    }

    #[test]
    fn test_negative_margin_detected() {
        let result = solve(&legs(&[dec!(1.5), dec!(1.5)]), dec!(100));

        assert!(!result.is_surebet);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::NegativeSurebet { .. })));
        assert!(close(result.legs[0].potential_profit, dec!(-25)));
        assert!(close(result.overall_profit_percentage, dec!(-25)));
    }

    #[test]
    fn test_all_target_matches_uniform_profit_formula() {
        let input = vec![
            Leg::new(dec!(2.2)).distributing(),
            Leg::new(dec!(2.05)).distributing(),
        ];
        let result = solve(&input, dec!(100));

        let book = Decimal::ONE / dec!(2.2) + Decimal::ONE / dec!(2.05);
        let profit = dec!(100) * (Decimal::ONE - book) / book;
        for leg in &result.legs {
            assert!(close(leg.calculated_stake, (dec!(100) + profit) / leg.leg.odd));
            assert!(close(leg.potential_profit, profit));
        }
        assert!(result.is_surebet);
    }

    #[test]
    fn test_all_target_break_even_flags_negative_surebet() {
        let input = vec![
            Leg::new(dec!(2)).distributing(),
            Leg::new(dec!(2)).distributing(),
        ];
        let result = solve(&input, dec!(100));
        assert!(result
            .diagnostics
            .contains(&Diagnostic::NegativeSurebet { book: dec!(1) }));
    }

    #[test]
    fn test_mixed_group_plain_breaks_even() {
        let input = vec![
            Leg::new(dec!(3)),
            Leg::new(dec!(3.5)).distributing(),
            Leg::new(dec!(4)).distributing(),
        ];
        let result = solve(&input, dec!(100));

        // Plain leg returns exactly the total
        assert!(close(result.legs[0].calculated_stake, dec!(100) / dec!(3)));
        assert_eq!(result.legs[0].potential_profit, Decimal::ZERO);

        // Target legs share one profit
        let p1 = result.legs[1].potential_profit;
        let p2 = result.legs[2].potential_profit;
        assert!(close(p1, p2));
        assert!(p1 > Decimal::ZERO);

        let sum: Decimal = result.stakes().iter().copied().sum();
        assert!(close(sum, dec!(100)));
        assert!(result.is_surebet);
        assert!(close(result.overall_profit_percentage, p1));
    }

    #[test]
    fn test_mixed_group_insufficient_budget() {
        let input = vec![
            Leg::new(dec!(1.5)),
            Leg::new(dec!(1.8)),
            Leg::new(dec!(5)).distributing(),
        ];
        let result = solve(&input, dec!(100));

        assert!(result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::InfeasibleAllocation { .. })));
        assert!(close(result.legs[0].calculated_stake, dec!(100) / dec!(1.5)));
        // Second plain leg only gets what is left
        assert!(close(
            result.legs[1].calculated_stake,
            dec!(100) - dec!(100) / dec!(1.5)
        ));
        assert_eq!(result.legs[2].calculated_stake, Decimal::ZERO);
        assert!(!result.is_surebet);
    }

    #[test]
    fn test_monotonic_in_total() {
        let odds = [dec!(2.3), dec!(3.1), dec!(6.5)];
        let small = solve(&legs(&odds), dec!(100));
        let large = solve(&legs(&odds), dec!(300));

        for (a, b) in small.legs.iter().zip(&large.legs) {
            assert!(close(b.calculated_stake, a.calculated_stake * dec!(3)));
        }
        assert!(close(
            small.overall_profit_percentage,
            large.overall_profit_percentage
        ));
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            Leg::new(dec!(2.3)),
            Leg::new(dec!(3.1)).distributing(),
            Leg::new(dec!(6.5)).distributing(),
        ];
        assert_eq!(solve(&input, dec!(137.5)), solve(&input, dec!(137.5)));
    }

    // =========================================================================
    // Break-even anchor
    // =========================================================================

    #[test]
    fn test_anchor_with_single_other_leg() {
        let input = vec![
            Leg::new(dec!(2.1)).with_fixed_stake(dec!(50)),
            Leg::new(dec!(2.1)).distributing(),
        ];
        let result = solve(&input, dec!(999));

        assert_eq!(
            result.funding_mode,
            Some(FundingMode::FixedStakeDriven(FixedAnchor::BreakEven { anchor: 0 }))
        );
        assert!(result.total_stake_locked);
        assert_eq!(result.total_stake, dec!(105));
        assert_eq!(result.legs[0].potential_profit, Decimal::ZERO);
        assert!(close(result.legs[1].calculated_stake, dec!(55)));
        assert!(close(result.legs[1].potential_profit, dec!(10.5)));
        assert!(result.is_surebet);
        assert!(close(result.overall_profit_percentage, dec!(10)));
    }

    #[test]
    fn test_anchor_profit_is_zero_regardless_of_odds() {
        for (anchor_odd, other_odd) in [
            (dec!(1.2), dec!(1.3)),
            (dec!(5), dec!(1.1)),
            (dec!(0), dec!(2)),
            (dec!(0.5), dec!(2)),
        ] {
            let input = vec![
                Leg::new(other_odd),
                Leg::new(anchor_odd).with_fixed_stake(dec!(20)),
                Leg::new(other_odd).distributing(),
            ];
            let result = solve(&input, dec!(100));
            assert_eq!(result.legs[1].potential_profit, Decimal::ZERO);
            assert_eq!(result.legs[1].calculated_stake, dec!(20));
        }
    }

    #[test]
    fn test_anchor_free_legs_consume_budget() {
        let input = vec![
            Leg::new(dec!(3)).with_fixed_stake(dec!(50)),
            Leg::new(dec!(3)),
            Leg::new(dec!(3.5)).distributing(),
        ];
        let result = solve(&input, dec!(0));

        assert_eq!(result.total_stake, dec!(150));
        assert!(close(result.legs[1].calculated_stake, dec!(50)));
        assert!(close(result.legs[2].calculated_stake, dec!(50)));
        assert_eq!(result.legs[1].potential_profit, Decimal::ZERO);
        assert!(close(result.legs[2].potential_profit, dec!(25)));
        let free_sum = result.legs[1].calculated_stake + result.legs[2].calculated_stake;
        assert!(close(free_sum, dec!(100)));
        assert!(result.is_surebet);
    }

    // =========================================================================
    // Fixed reference
    // =========================================================================

    #[test]
    fn test_single_distributing_fixed_leg_with_plain_others() {
        let input = vec![
            Leg::new(dec!(3)).with_fixed_stake(dec!(40)).distributing(),
            Leg::new(dec!(3)),
            Leg::new(dec!(3.5)),
        ];
        let result = solve(&input, dec!(0));

        let book = Decimal::ONE / dec!(3) + Decimal::ONE / dec!(3.5);
        let total = dec!(40) / (Decimal::ONE - book);
        assert!(close(result.total_stake, total));
        assert!(close(result.legs[1].potential_profit, Decimal::ZERO));
        assert!(close(result.legs[2].potential_profit, Decimal::ZERO));
        assert_eq!(result.legs[0].calculated_stake, dec!(40));
        assert!(result.total_stake_locked);
    }

    #[test]
    fn test_reference_uses_largest_fixed_payout() {
        let input = vec![
            Leg::new(dec!(2)).with_fixed_stake(dec!(30)),
            Leg::new(dec!(4)).with_fixed_stake(dec!(20)),
            Leg::new(dec!(5)).distributing(),
        ];
        let result = solve(&input, dec!(0));

        // Largest fixed payout is 4 * 20 = 80
        assert!(close(result.legs[2].calculated_stake, dec!(16)));
        assert_eq!(result.total_stake, dec!(66));
        assert_eq!(result.legs[0].calculated_stake, dec!(30));
        assert_eq!(result.legs[1].calculated_stake, dec!(20));
        // Leg 0 would need 40 to pay 80
        assert!(result.diagnostics.contains(&Diagnostic::FixedStakeConflict {
            leg: 0,
            anchor: 1,
            fixed: dec!(30),
            required: dec!(40),
        }));
    }

    #[test]
    fn test_fixed_target_leg_is_not_anchor_filler() {
        let input = vec![
            Leg::new(dec!(3)).with_fixed_stake(dec!(50)),
            Leg::new(dec!(3)).with_fixed_stake(dec!(20)).distributing(),
            Leg::new(dec!(3.5)).distributing(),
        ];
        let result = solve(&input, dec!(0));

        assert_eq!(
            result.funding_mode,
            Some(FundingMode::FixedStakeDriven(FixedAnchor::Reference))
        );
        assert!(result.total_stake_locked);
        assert_eq!(result.stakes()[..2], [dec!(50), dec!(20)]);
        assert!(close(result.legs[2].calculated_stake, dec!(150) / dec!(3.5)));
        assert!(result.diagnostics.contains(&Diagnostic::FixedStakeConflict {
            leg: 1,
            anchor: 0,
            fixed: dec!(20),
            required: dec!(50),
        }));
        assert!(!result.diagnostic_message.is_empty());
        assert!(result.legs[1].potential_profit < Decimal::ZERO);
        assert!(!result.is_surebet);
    }

    #[test]
    fn test_matching_fixed_payouts_are_not_a_conflict() {
        let input = vec![
            Leg::new(dec!(2)).with_fixed_stake(dec!(50)),
            Leg::new(dec!(2)).with_fixed_stake(dec!(50)).distributing(),
        ];
        let result = solve(&input, dec!(0));

        assert_eq!(
            result.funding_mode,
            Some(FundingMode::FixedStakeDriven(FixedAnchor::Reference))
        );
        assert!(result.is_clean());
        assert_eq!(result.total_stake, dec!(100));
        assert_eq!(result.profits(), vec![Decimal::ZERO, Decimal::ZERO]);
    }

    #[test]
    fn test_reference_unreachable_break_even() {
        let input = vec![
            Leg::new(dec!(3)).with_fixed_stake(dec!(40)).distributing(),
            Leg::new(dec!(1.5)),
            Leg::new(dec!(1.8)),
        ];
        let result = solve(&input, dec!(0));

        assert!(result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BreakEvenUnreachable { .. })));
        assert_eq!(result.legs[1].calculated_stake, Decimal::ZERO);
        assert_eq!(result.total_stake, dec!(40));
    }

    // =========================================================================
    // Guards
    // =========================================================================

    #[test]
    fn test_rescale_reports_adjustment() {
        let input = legs(&[dec!(2), dec!(2)]);
        let config = SolverConfig::default();
        let mut state = Solve::new(&input, &config);
        state.stakes = vec![dec!(60), dec!(60)];

        state.rescale(&[0, 1], dec!(100)).unwrap();

        assert!(close(state.stakes[0], dec!(50)));
        assert!(state
            .diagnostics
            .any(|d| matches!(d, Diagnostic::AdjustmentApplied { .. })));
    }

    #[test]
    fn test_rescale_within_tolerance_is_noop() {
        let input = legs(&[dec!(2), dec!(2)]);
        let config = SolverConfig::default();
        let mut state = Solve::new(&input, &config);
        state.stakes = vec![dec!(50.2), dec!(50)];

        state.rescale(&[0, 1], dec!(100)).unwrap();

        assert_eq!(state.stakes[0], dec!(50.2));
        assert!(state.diagnostics.is_empty());
    }

    #[test]
    fn test_negative_stakes_are_clamped() {
        let input = legs(&[dec!(2), dec!(2)]);
        let config = SolverConfig::default();
        let mut state = Solve::new(&input, &config);
        state.stakes = vec![dec!(-3), dec!(10)];

        let result = state
            .finish(FundingMode::TotalStakeDriven { total: dec!(10) })
            .unwrap();

        assert_eq!(result.legs[0].calculated_stake, Decimal::ZERO);
        assert!(result
            .diagnostics
            .contains(&Diagnostic::NegativeStakeClamped { leg: 0 }));
    }

    #[test]
    fn test_mixed_group_at_exact_break_even_is_flagged() {
        // 1/2 + 1/4 + 1/4 = 1: target legs can only return the total
        let input = vec![
            Leg::new(dec!(2)),
            Leg::new(dec!(4)).distributing(),
            Leg::new(dec!(4)).distributing(),
        ];
        let result = solve(&input, dec!(100));

        assert!(result
            .diagnostics
            .contains(&Diagnostic::NegativeSurebet { book: dec!(1) }));
        assert_eq!(result.profits(), vec![Decimal::ZERO; 3]);
    }

    #[test]
    fn test_overflowing_anchor_payout_is_reported() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(20), 0);
        let stake = Decimal::from_i128_with_scale(10_i128.pow(10), 0);
        let input = vec![Leg::new(huge).with_fixed_stake(stake), Leg::new(dec!(2))];

        let result = solve(&input, dec!(0));

        assert_eq!(result.diagnostics, vec![Diagnostic::AmountOutOfRange]);
        assert_eq!(result.stakes(), vec![Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(result.total_stake, Decimal::ZERO);
        assert!(result.total_stake_locked);
        assert!(!result.is_surebet);
    }

    #[test]
    fn test_overflowing_reference_payout_is_reported() {
        let input = vec![
            Leg::new(Decimal::MAX).with_fixed_stake(dec!(10)),
            Leg::new(dec!(2)).with_fixed_stake(dec!(10)),
            Leg::new(dec!(3)),
        ];

        let result = solve(&input, dec!(0));

        assert_eq!(result.diagnostics, vec![Diagnostic::AmountOutOfRange]);
        assert_eq!(
            result.funding_mode,
            Some(FundingMode::FixedStakeDriven(FixedAnchor::Reference))
        );
    }

    #[test]
    fn test_custom_floor_changes_verdict() {
        let input = legs(&[dec!(1.98), dec!(1.98)]);
        let strict = AllocationEngine::new().solve(&input, dec!(100));
        assert!(!strict.is_surebet);

        let config = SolverConfig {
            surebet_floor: dec!(2),
            ..SolverConfig::default()
        };
        let lenient = AllocationEngine::with_config(config).solve(&input, dec!(100));
        assert!(lenient.is_surebet);
    }
}
