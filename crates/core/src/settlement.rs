//! Bet records, settlement arithmetic and bankroll statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::traits::BetRepository;

// =============================================================================
// Bet Type / Status
// =============================================================================

/// How a bet pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    /// Plain back bet at a bookmaker, no commission.
    #[default]
    Simple,
    /// Exchange back bet; commission is charged on winnings.
    Back,
    /// Exchange lay bet; the stake is the backer's stake, the liability is `(odds - 1) * stake`.
    Lay,
}

impl BetType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Back => "back",
            Self::Lay => "lay",
        }
    }
}

impl std::fmt::Display for BetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    #[default]
    Pending,
    Won,
    Lost,
    Cashout,
}

impl BetStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Cashout => "cashout",
        }
    }

    #[must_use]
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Profit of a bet once its status is known.
///
/// `commission_pct` is a percentage (e.g. `5` for 5%) applied to exchange
/// winnings. Pending and cashout bets settle to zero here; a cashout's
/// realized amount is recorded directly on the bet.
#[must_use]
pub fn settled_profit(
    stake: Decimal,
    odds: Decimal,
    bet_type: BetType,
    status: BetStatus,
    commission_pct: Decimal,
) -> Decimal {
    let commission = |amount: Decimal| amount * commission_pct / Decimal::ONE_HUNDRED;

    match (bet_type, status) {
        (_, BetStatus::Pending | BetStatus::Cashout) => Decimal::ZERO,
        (BetType::Simple, BetStatus::Won) => stake * (odds - Decimal::ONE),
        (BetType::Back, BetStatus::Won) => {
            let gross = stake * (odds - Decimal::ONE);
            gross - commission(gross)
        }
        (BetType::Lay, BetStatus::Won) => stake - commission(stake),
        (BetType::Simple | BetType::Back, BetStatus::Lost) => -stake,
        (BetType::Lay, BetStatus::Lost) => -(odds - Decimal::ONE) * stake,
    }
}

// =============================================================================
// Bet
// =============================================================================

/// A wager recorded against a bankroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub bankroll_id: String,
    pub bookie_id: String,
    pub sport_id: String,
    pub match_description: String,
    pub date: DateTime<Utc>,
    pub stake: Decimal,
    pub odds: Decimal,
    #[serde(default)]
    pub bet_type: BetType,
    #[serde(default)]
    pub status: BetStatus,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub profit: Decimal,
    /// Account that owns the bet.
    #[serde(default)]
    pub created_by: String,
}

impl Bet {
    /// Liability of a lay bet; zero for other types.
    #[must_use]
    pub fn responsibility(&self) -> Decimal {
        match self.bet_type {
            BetType::Lay => (self.odds - Decimal::ONE) * self.stake,
            BetType::Simple | BetType::Back => Decimal::ZERO,
        }
    }

    /// Profit implied by the current status.
    #[must_use]
    pub fn settled_profit(&self) -> Decimal {
        settled_profit(
            self.stake,
            self.odds,
            self.bet_type,
            self.status,
            self.commission,
        )
    }

    /// Moves the bet to `status` and records the resulting profit.
    ///
    /// A cashout keeps whatever profit was already recorded.
    pub fn settle(&mut self, status: BetStatus) {
        self.status = status;
        if status != BetStatus::Cashout {
            self.profit = self.settled_profit();
        }
    }

    /// Closes the bet early for `returned`, the amount paid back by the bookmaker.
    pub fn cash_out(&mut self, returned: Decimal) {
        self.status = BetStatus::Cashout;
        self.profit = returned - self.stake;
    }
}

// =============================================================================
// Settling Recorded Bets
// =============================================================================

#[derive(Debug, Error)]
pub enum SettleError {
    #[error("bet {0} not found")]
    NotFound(Uuid),

    #[error("a cashout needs the amount returned")]
    MissingCashout,

    #[error("a cashout amount only applies to the cashout status")]
    UnexpectedCashout,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Settles a stored bet and writes the new status and profit back.
///
/// # Errors
/// Fails if the bet does not exist, the cashout amount does not match the
/// status, or the repository fails.
pub async fn settle_recorded_bet<R>(
    repo: &R,
    id: Uuid,
    status: BetStatus,
    cashout: Option<Decimal>,
) -> Result<Bet, SettleError>
where
    R: BetRepository + ?Sized,
{
    let mut bet = repo.get_bet(id).await?.ok_or(SettleError::NotFound(id))?;

    match (status, cashout) {
        (BetStatus::Cashout, Some(returned)) => bet.cash_out(returned),
        (BetStatus::Cashout, None) => return Err(SettleError::MissingCashout),
        (_, Some(_)) => return Err(SettleError::UnexpectedCashout),
        (_, None) => bet.settle(status),
    }

    repo.update_bet(&bet).await?;
    info!(bet = %bet.id, status = %bet.status, profit = %bet.profit, "settled bet");

    Ok(bet)
}

// =============================================================================
// Bankroll Statistics
// =============================================================================

/// Aggregates over the bets of one bankroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankrollStats {
    pub total_bets: usize,
    pub total_profit: Decimal,
    pub total_stake: Decimal,
    /// Profit over stake, in percent.
    pub roi: Decimal,
    /// Profit over the initial amount, in percent.
    pub progress: Decimal,
    pub current_amount: Decimal,
}

impl BankrollStats {
    #[must_use]
    pub fn from_bets(bets: &[Bet], initial_amount: Decimal) -> Self {
        let total_profit: Decimal = bets.iter().map(|bet| bet.profit).sum();
        let total_stake: Decimal = bets.iter().map(|bet| bet.stake).sum();

        let roi = if total_stake > Decimal::ZERO {
            total_profit / total_stake * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let progress = if initial_amount > Decimal::ZERO {
            total_profit / initial_amount * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Self {
            total_bets: bets.len(),
            total_profit,
            total_stake,
            roi,
            progress,
            current_amount: initial_amount + total_profit,
        }
    }
}

// =============================================================================
// History Grouping
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub bets: Vec<Bet>,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    /// `YYYY-MM`.
    pub month: String,
    pub days: BTreeMap<NaiveDate, DaySummary>,
    pub total_profit: Decimal,
}

/// Groups bets by UTC month and day, oldest first.
#[must_use]
pub fn group_by_month(bets: &[Bet]) -> BTreeMap<String, MonthSummary> {
    let mut months: BTreeMap<String, MonthSummary> = BTreeMap::new();

    for bet in bets {
        let day = bet.date.date_naive();
        let key = format!("{:04}-{:02}", day.year(), day.month());

        let month = months.entry(key.clone()).or_insert_with(|| MonthSummary {
            month: key,
            days: BTreeMap::new(),
            total_profit: Decimal::ZERO,
        });
        let summary = month.days.entry(day).or_insert_with(|| DaySummary {
            date: day,
            bets: Vec::new(),
            profit: Decimal::ZERO,
        });

        summary.bets.push(bet.clone());
        summary.profit += bet.profit;
        month.total_profit += bet.profit;
    }

    months
}
