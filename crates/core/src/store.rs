//! JSON file storage for bet records.
//!
//! Bets are kept in a single pretty-printed document:
//!
//! ```text
//! { "bets": [ { "id": "...", "stake": "50.00", ... }, ... ] }
//! ```
//!
//! A missing file reads as an empty store. A corrupt file is an error, never
//! silently replaced, so recorded bets cannot be lost by the next write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::Bookmaker;
use crate::settlement::Bet;
use crate::traits::{BetRepository, BookmakerDirectory};

/// Errors from bet storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bet {0} not found")]
    NotFound(Uuid),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    bets: Vec<Bet>,
}

/// File-backed [`BetRepository`].
#[derive(Debug)]
pub struct JsonBetStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonBetStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoreDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No bet store found, starting empty");
                Ok(StoreDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(
            path = %self.path.display(),
            bets = document.bets.len(),
            "Saved bet store"
        );
        Ok(())
    }

    /// Every bet in the store regardless of owner.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn all(&self) -> Result<Vec<Bet>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.bets)
    }

    /// Appends `bets` in one write.
    ///
    /// # Errors
    /// Returns an error if the existing file is unreadable or the write fails.
    pub async fn append(&self, bets: &[Bet]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        document.bets.extend_from_slice(bets);
        self.write(&document).await
    }

    /// Overwrites the stored bet that shares `bet.id`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no bet has that id, or an IO/JSON
    /// error if the file cannot be read or written.
    pub async fn replace(&self, bet: &Bet) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        let slot = document
            .bets
            .iter_mut()
            .find(|stored| stored.id == bet.id)
            .ok_or(StoreError::NotFound(bet.id))?;
        *slot = bet.clone();
        self.write(&document).await
    }
}

#[async_trait]
impl BetRepository for JsonBetStore {
    async fn count_bets(&self, owner: &str) -> anyhow::Result<usize> {
        Ok(self.list_bets(owner).await?.len())
    }

    async fn list_bets(&self, owner: &str) -> anyhow::Result<Vec<Bet>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|bet| bet.created_by == owner)
            .collect())
    }

    async fn insert_bets(&self, bets: &[Bet]) -> anyhow::Result<()> {
        self.append(bets).await?;
        Ok(())
    }

    async fn get_bet(&self, id: Uuid) -> anyhow::Result<Option<Bet>> {
        Ok(self.all().await?.into_iter().find(|bet| bet.id == id))
    }

    async fn update_bet(&self, bet: &Bet) -> anyhow::Result<()> {
        self.replace(bet).await?;
        Ok(())
    }
}

/// Bookmakers from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticBookmakerDirectory {
    bookmakers: Vec<Bookmaker>,
}

impl StaticBookmakerDirectory {
    #[must_use]
    pub fn new(bookmakers: Vec<Bookmaker>) -> Self {
        Self { bookmakers }
    }
}

#[async_trait]
impl BookmakerDirectory for StaticBookmakerDirectory {
    async fn list(&self) -> anyhow::Result<Vec<Bookmaker>> {
        Ok(self.bookmakers.clone())
    }
}
