//! Process-local campaign store.
//!
//! Records live in a `RwLock`-guarded map owned by the store value, so two
//! stores never share state. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use adflow_core::types::{DbId, Timestamp};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::campaign::{Campaign, CampaignUpdate, CreateCampaign};
use crate::store::{CampaignStore, StoreBackend, StoreError};

/// In-memory [`CampaignStore`] backend.
#[derive(Debug)]
pub struct InMemoryCampaignStore {
    campaigns: RwLock<HashMap<DbId, Campaign>>,
    next_id: AtomicI64,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored campaigns.
    pub async fn len(&self) -> usize {
        self.campaigns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.campaigns.read().await.is_empty()
    }
}

impl Default for InMemoryCampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::InMemory
    }

    async fn create(&self, input: &CreateCampaign) -> Result<Campaign, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let campaign = Campaign::new(id, input, Utc::now());
        self.campaigns.write().await.insert(id, campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, id: DbId) -> Result<Option<Campaign>, StoreError> {
        Ok(self.campaigns.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: DbId,
        update: &CampaignUpdate,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut campaigns = self.campaigns.write().await;
        let Some(campaign) = campaigns.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(constraint) = update.violated_constraint() {
            return Err(StoreError::Constraint(constraint));
        }
        campaign.apply(update, Utc::now());
        Ok(Some(campaign.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.campaigns.write().await.remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().await;
        let mut owned: Vec<Campaign> = campaigns
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        // Ids break ties between records created within the same instant.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().await;
        let mut stale: Vec<Campaign> = campaigns
            .values()
            .filter(|c| !c.status.is_terminal() && c.updated_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|c| c.id);
        Ok(stale)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
