//! Turning a solved surebet into pending bet records.
//!
//! The allocation engine only produces numbers. A [`SurebetTicket`] carries the
//! bankroll, sport and event the user chose, validates that the solve is worth
//! recording, and materializes one [`Bet`] per staked leg. [`record_surebet`]
//! adds the account gate and hands the bets to a [`BetRepository`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::LimitsConfig;
use crate::settlement::{Bet, BetStatus, BetType};
use crate::traits::BetRepository;
use crate::types::{AllocationResult, LegAllocation};

/// Something missing before a ticket can be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TicketIssue {
    #[error("select a bankroll")]
    MissingBankroll,
    #[error("select a sport")]
    MissingSport,
    #[error("describe the match or event")]
    MissingDescription,
    #[error("at least 2 legs with a valid odd and a calculated stake are required ({valid} found)")]
    TooFewLegs { valid: usize },
    #[error("select a bookmaker for leg #{}", .leg + 1)]
    MissingBookmaker { leg: usize },
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("invalid ticket: {}", join_issues(.issues))]
    Invalid { issues: Vec<TicketIssue> },

    #[error("account is blocked and cannot add bets")]
    AccountBlocked,

    #[error("bet limit of {limit} reached: {existing} bets held, {adding} more requested")]
    LimitExceeded {
        limit: u32,
        existing: usize,
        adding: usize,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn join_issues(issues: &[TicketIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Account Plan
// =============================================================================

/// The parts of an account that gate recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPlan {
    /// Replaces the default bet limit for this account.
    pub bet_limit_override: Option<u32>,
    pub is_blocked: bool,
}

impl AccountPlan {
    #[must_use]
    pub fn bet_limit(&self, default_limit: u32) -> u32 {
        self.bet_limit_override.unwrap_or(default_limit)
    }

    /// Checks that `adding` more bets fit next to `existing` ones.
    ///
    /// # Errors
    /// Returns [`TicketError::AccountBlocked`] or [`TicketError::LimitExceeded`].
    pub fn check_capacity(
        &self,
        existing: usize,
        adding: usize,
        default_limit: u32,
    ) -> Result<(), TicketError> {
        if self.is_blocked {
            return Err(TicketError::AccountBlocked);
        }

        let limit = self.bet_limit(default_limit);
        if existing + adding > limit as usize {
            return Err(TicketError::LimitExceeded {
                limit,
                existing,
                adding,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Ticket
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurebetTicket {
    pub bankroll_id: String,
    pub sport_id: String,
    pub match_description: String,
}

impl SurebetTicket {
    #[must_use]
    pub fn new(
        bankroll_id: impl Into<String>,
        sport_id: impl Into<String>,
        match_description: impl Into<String>,
    ) -> Self {
        Self {
            bankroll_id: bankroll_id.into(),
            sport_id: sport_id.into(),
            match_description: match_description.into(),
        }
    }

    /// Legs worth recording: a positive odd and a positive stake.
    fn recordable(result: &AllocationResult) -> impl Iterator<Item = (usize, &LegAllocation)> {
        result.legs.iter().enumerate().filter(|(_, leg)| {
            leg.leg.odd > Decimal::ZERO && leg.calculated_stake > Decimal::ZERO
        })
    }

    /// Lists everything preventing this ticket from being recorded.
    #[must_use]
    pub fn validate(&self, result: &AllocationResult) -> Vec<TicketIssue> {
        let mut issues = Vec::new();

        if self.bankroll_id.trim().is_empty() {
            issues.push(TicketIssue::MissingBankroll);
        }
        if self.sport_id.trim().is_empty() {
            issues.push(TicketIssue::MissingSport);
        }
        if self.match_description.trim().is_empty() {
            issues.push(TicketIssue::MissingDescription);
        }

        let valid: Vec<(usize, &LegAllocation)> = Self::recordable(result).collect();
        if valid.len() < 2 {
            issues.push(TicketIssue::TooFewLegs { valid: valid.len() });
        }
        for (index, leg) in valid {
            let missing = leg
                .leg
                .bookmaker
                .as_deref()
                .map_or(true, |id| id.trim().is_empty());
            if missing {
                issues.push(TicketIssue::MissingBookmaker { leg: index });
            }
        }

        issues
    }

    /// Builds one pending bet per recordable leg.
    ///
    /// Stakes and odds are rounded to cents.
    ///
    /// # Errors
    /// Returns [`TicketError::Invalid`] if [`Self::validate`] reports issues.
    pub fn build_bets(
        &self,
        result: &AllocationResult,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bet>, TicketError> {
        let issues = self.validate(result);
        if !issues.is_empty() {
            return Err(TicketError::Invalid { issues });
        }

        Ok(Self::recordable(result)
            .map(|(_, leg)| Bet {
                id: Uuid::new_v4(),
                bankroll_id: self.bankroll_id.clone(),
                bookie_id: leg.leg.bookmaker.clone().unwrap_or_default(),
                sport_id: self.sport_id.clone(),
                match_description: self.match_description.trim().to_string(),
                date: now,
                stake: leg.calculated_stake.round_dp(2),
                odds: leg.leg.odd.round_dp(2),
                bet_type: BetType::Simple,
                status: BetStatus::Pending,
                commission: Decimal::ZERO,
                profit: Decimal::ZERO,
                created_by: owner.to_string(),
            })
            .collect())
    }
}

/// Validates, gates and persists a solved surebet.
///
/// # Errors
/// Fails on validation issues, a blocked account, an exceeded bet limit, or a
/// repository error. Nothing is written unless every check passes.
pub async fn record_surebet<R>(
    repo: &R,
    plan: &AccountPlan,
    owner: &str,
    ticket: &SurebetTicket,
    result: &AllocationResult,
    limits: &LimitsConfig,
) -> Result<Vec<Bet>, TicketError>
where
    R: BetRepository + ?Sized,
{
    let bets = ticket.build_bets(result, owner, Utc::now())?;

    let existing = repo.count_bets(owner).await?;
    plan.check_capacity(existing, bets.len(), limits.default_bet_limit)?;

    repo.insert_bets(&bets).await?;
    info!(
        owner,
        bankroll = %ticket.bankroll_id,
        count = bets.len(),
        "recorded surebet legs"
    );

    Ok(bets)
}
