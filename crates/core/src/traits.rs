use crate::config::Bookmaker;
use crate::settlement::Bet;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for bet records.
#[async_trait]
pub trait BetRepository: Send + Sync {
    /// Number of bets held by `owner`.
    async fn count_bets(&self, owner: &str) -> Result<usize>;
    async fn list_bets(&self, owner: &str) -> Result<Vec<Bet>>;
    async fn insert_bets(&self, bets: &[Bet]) -> Result<()>;
    async fn get_bet(&self, id: Uuid) -> Result<Option<Bet>>;

    /// Replaces the stored bet with the same id. Fails if there is none.
    async fn update_bet(&self, bet: &Bet) -> Result<()>;
}

/// Read-only bookmaker listing used to label legs.
#[async_trait]
pub trait BookmakerDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<Bookmaker>>;

    /// Finds a bookmaker by id, or by name ignoring ASCII case.
    async fn find(&self, key: &str) -> Result<Option<Bookmaker>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|bookmaker| bookmaker.id == key || bookmaker.name.eq_ignore_ascii_case(key)))
    }
}
