//! Repository for the `campaigns` table.
//!
//! Result payloads are stored as JSONB and decoded through
//! `sqlx::types::Json`. Status literals come from `CampaignStatus`.

use adflow_core::campaign::{CampaignStatus, StatusId};
use adflow_core::types::{DbId, Timestamp};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::campaign::{Campaign, CampaignRow, CampaignUpdate, CreateCampaign};
use crate::store::{CampaignStore, StoreBackend, StoreError};

/// Column list for `campaigns` queries.
const COLUMNS: &str = "\
    id, owner_id, website_url, platforms, tone, goal, status_id, \
    brand_research, generated_content, generated_images, critique, \
    error_message, created_at, updated_at";

/// Terminal statuses: completed, failed.
const TERMINAL_STATUSES: [StatusId; 2] = [
    CampaignStatus::Completed as StatusId,
    CampaignStatus::Failed as StatusId,
];

/// Provides CRUD operations for campaigns.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a new campaign in `pending` status.
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<CampaignRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns (owner_id, website_url, platforms, tone, goal, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(input.owner_id)
            .bind(&input.website_url)
            .bind(Json(&input.platforms))
            .bind(&input.tone)
            .bind(input.goal.as_str())
            .bind(CampaignStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a campaign by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CampaignRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update in a single statement.
    ///
    /// `None` fields keep their stored value via `COALESCE`. When a status is
    /// written, `error_message` takes the supplied message for `failed` and
    /// is cleared for every other status.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CampaignUpdate,
    ) -> Result<Option<CampaignRow>, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET \
                status_id = COALESCE($2, status_id), \
                tone = COALESCE($3, tone), \
                brand_research = COALESCE($4, brand_research), \
                generated_content = COALESCE($5, generated_content), \
                generated_images = COALESCE($6, generated_images), \
                critique = COALESCE($7, critique), \
                error_message = CASE \
                    WHEN $2::SMALLINT IS NULL THEN error_message \
                    WHEN $2 = $9 THEN $8 \
                    ELSE NULL \
                END, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(id)
            .bind(input.status.map(CampaignStatus::id))
            .bind(input.tone.as_deref())
            .bind(input.brand_research.as_ref().map(Json))
            .bind(input.generated_content.as_ref().map(Json))
            .bind(input.generated_images.as_ref().map(Json))
            .bind(input.critique.as_ref().map(Json))
            .bind(input.error_message.as_deref())
            .bind(CampaignStatus::Failed.id())
            .fetch_optional(pool)
            .await
    }

    /// Delete a campaign. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List an owner's campaigns, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<CampaignRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// List non-terminal campaigns last touched before `cutoff`.
    pub async fn list_stale(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<CampaignRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns \
             WHERE status_id <> ALL($1) AND updated_at < $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(&TERMINAL_STATUSES[..])
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}

/// PostgreSQL-backed [`CampaignStore`].
#[derive(Debug, Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
}

impl PgCampaignStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode(row: CampaignRow) -> Result<Campaign, StoreError> {
    let id = row.id;
    Campaign::try_from(row).map_err(|e| {
        tracing::error!(campaign_id = id, error = %e, "Failed to decode campaign row");
        StoreError::Corrupt(e.to_string())
    })
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn create(&self, input: &CreateCampaign) -> Result<Campaign, StoreError> {
        decode(CampaignRepo::create(&self.pool, input).await?)
    }

    async fn get(&self, id: DbId) -> Result<Option<Campaign>, StoreError> {
        CampaignRepo::find_by_id(&self.pool, id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn update(
        &self,
        id: DbId,
        update: &CampaignUpdate,
    ) -> Result<Option<Campaign>, StoreError> {
        CampaignRepo::update(&self.pool, id, update)
            .await?
            .map(decode)
            .transpose()
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(CampaignRepo::delete(&self.pool, id).await?)
    }

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Campaign>, StoreError> {
        CampaignRepo::list_by_owner(&self.pool, owner_id)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Campaign>, StoreError> {
        CampaignRepo::list_stale(&self.pool, cutoff)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
