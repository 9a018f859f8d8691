//! The campaign status store contract.
//!
//! The orchestrator writes lifecycle and result fields through this trait;
//! HTTP handlers and pollers read through it. Backends are chosen once at
//! startup and shared as `Arc<dyn CampaignStore>`.

use adflow_core::types::{DbId, Timestamp};
use async_trait::async_trait;
use serde::Serialize;

use crate::models::campaign::{Campaign, CampaignUpdate, CreateCampaign};

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be decoded into a [`Campaign`].
    #[error("Corrupt campaign record: {0}")]
    Corrupt(String),

    /// The write would break a table check; nothing was changed.
    #[error("Update violates constraint: {0}")]
    Constraint(&'static str),
}

/// Which backend a store is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Postgres,
    InMemory,
}

impl StoreBackend {
    /// Whether records survive a process restart.
    pub fn is_persistent(self) -> bool {
        matches!(self, Self::Postgres)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::InMemory => "in_memory",
        }
    }
}

/// Durable keyed record of a campaign's lifecycle stage and results.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Insert a new campaign in `pending` status.
    async fn create(&self, input: &CreateCampaign) -> Result<Campaign, StoreError>;

    async fn get(&self, id: DbId) -> Result<Option<Campaign>, StoreError>;

    /// Merge `update` into the record and bump `updated_at`.
    ///
    /// Returns `None` without side effects when the id does not exist.
    async fn update(
        &self,
        id: DbId,
        update: &CampaignUpdate,
    ) -> Result<Option<Campaign>, StoreError>;

    /// Remove the record. Returns `true` if a row was deleted.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;

    /// All campaigns owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Campaign>, StoreError>;

    /// Non-terminal campaigns whose `updated_at` is older than `cutoff`.
    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Campaign>, StoreError>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
