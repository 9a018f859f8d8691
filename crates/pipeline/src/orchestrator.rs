//! Campaign run orchestrator.
//!
//! Drives one campaign through its stages:
//! 1. `researching`: research the website (fatal on error).
//! 2. `generating-content`: persist research, generate copy (fatal).
//! 3. `critiquing`: critique (falls back) then refine (keeps original).
//! 4. `generating-images`: render per platform (failed platforms omitted).
//! 5. `completed`: persist every result and the scored critique.
//!
//! Each status is written before the stage it announces. Nothing is
//! returned to the caller; outcomes are visible only through the store.

use std::future::Future;
use std::sync::Arc;

use adflow_core::campaign::{
    BrandResearch, CampaignStatus, GeneratedContent, GeneratedImage, Platform,
};
use adflow_core::critique::{self, CritiqueResult, CritiqueSummary};
use adflow_core::types::DbId;
use adflow_db::models::campaign::{Campaign, CampaignUpdate};
use adflow_db::{CampaignStore, StoreError};
use futures::StreamExt;

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::stages::Collaborators;

/// Maximum length of a persisted `error_message`, in characters.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Stored when a failure carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Stored when the run aborted because the store itself failed.
pub const STORAGE_ERROR_MESSAGE: &str = "storage error";

/// Trim and bound a failure message for storage.
pub fn sanitize_error_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Why a run stopped before reaching `completed`.
#[derive(Debug)]
enum RunAbort {
    /// A fatal stage failed.
    Stage(StageError),
    Store(StoreError),
    IllegalTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },
    /// The record disappeared mid-run.
    Missing,
}

impl From<StoreError> for RunAbort {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Tracks the status a run last wrote and enforces the state machine on
/// every subsequent write.
struct StatusCursor<'a> {
    store: &'a dyn CampaignStore,
    id: DbId,
    status: CampaignStatus,
}

impl<'a> StatusCursor<'a> {
    fn new(store: &'a dyn CampaignStore, campaign: &Campaign) -> Self {
        Self {
            store,
            id: campaign.id,
            status: campaign.status,
        }
    }

    /// Move forward to `update.status`, writing the update atomically.
    async fn advance(&mut self, update: CampaignUpdate) -> Result<(), RunAbort> {
        let next = update.status.unwrap_or(self.status);
        if !self.status.can_transition_to(next) {
            return Err(RunAbort::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.write(next, update).await
    }

    /// Re-enter the pipeline from a terminal state (regeneration).
    async fn restart(&mut self, update: CampaignUpdate) -> Result<(), RunAbort> {
        let next = update.status.unwrap_or(self.status);
        if !self.status.can_restart_at(next) {
            return Err(RunAbort::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.write(next, update).await
    }

    async fn write(&mut self, next: CampaignStatus, update: CampaignUpdate) -> Result<(), RunAbort> {
        match self.store.update(self.id, &update).await? {
            Some(_) => {
                tracing::info!(
                    campaign_id = self.id,
                    from = %self.status,
                    to = %next,
                    "Campaign status changed",
                );
                self.status = next;
                Ok(())
            }
            None => Err(RunAbort::Missing),
        }
    }
}

/// Runs campaigns against a store and a set of collaborators.
///
/// Held by the dispatcher as an `Arc<CampaignOrchestrator>`; each run is
/// independent and may execute concurrently with runs for other campaigns.
pub struct CampaignOrchestrator {
    store: Arc<dyn CampaignStore>,
    collaborators: Collaborators,
    config: PipelineConfig,
}

impl CampaignOrchestrator {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        collaborators: Collaborators,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn CampaignStore> {
        &self.store
    }

    /// Execute a full run for campaign `id`.
    ///
    /// A missing record is logged and ignored. Terminal records are left
    /// alone; they re-enter the pipeline only through [`Self::regenerate`].
    pub async fn run(&self, id: DbId) {
        let Some(campaign) = self.load(id).await else {
            return;
        };
        if campaign.status.is_terminal() {
            tracing::warn!(
                campaign_id = id,
                status = %campaign.status,
                "Campaign already finished, skipping run",
            );
            return;
        }

        tracing::info!(campaign_id = id, website_url = %campaign.website_url, "Campaign run started");
        let result = self.execute_full(&campaign).await;
        self.finish(id, result).await;
    }

    /// Regenerate copy and critique from stored research.
    ///
    /// `new_tone` replaces the stored tone for this run and is persisted on
    /// success. Research and any existing images are left untouched; a
    /// record that never got images completes with an empty list.
    pub async fn regenerate(&self, id: DbId, new_tone: Option<String>) {
        let Some(campaign) = self.load(id).await else {
            return;
        };
        if !campaign.status.is_terminal() {
            tracing::warn!(
                campaign_id = id,
                status = %campaign.status,
                "Campaign still processing, skipping regeneration",
            );
            return;
        }
        let Some(research) = campaign.brand_research.clone() else {
            tracing::warn!(
                campaign_id = id,
                "Campaign has no brand research, skipping regeneration",
            );
            return;
        };

        tracing::info!(campaign_id = id, new_tone = ?new_tone, "Campaign regeneration started");
        let result = self
            .execute_regeneration(&campaign, research, new_tone)
            .await;
        self.finish(id, result).await;
    }

    /// Write a `failed` status with a sanitized message.
    ///
    /// Errors are logged, never returned: this is the last write a run makes.
    pub async fn mark_failed(&self, id: DbId, message: &str) {
        let message = sanitize_error_message(message);
        match self.store.update(id, &CampaignUpdate::failed(&message)).await {
            Ok(Some(_)) => {
                tracing::warn!(campaign_id = id, error = %message, "Campaign failed");
            }
            Ok(None) => {
                tracing::warn!(campaign_id = id, "Campaign vanished before failure could be recorded");
            }
            Err(e) => {
                tracing::error!(
                    campaign_id = id,
                    error = %e,
                    original_error = %message,
                    "Failed to record campaign failure",
                );
            }
        }
    }

    // ---- runs ----

    async fn execute_full(&self, campaign: &Campaign) -> Result<(), RunAbort> {
        let mut cursor = StatusCursor::new(self.store.as_ref(), campaign);

        cursor
            .advance(CampaignUpdate::status(CampaignStatus::Researching))
            .await?;
        let research = self
            .bounded(
                "research",
                self.collaborators.researcher.research(&campaign.website_url),
            )
            .await
            .map_err(RunAbort::Stage)?;

        cursor
            .advance(
                CampaignUpdate::status(CampaignStatus::GeneratingContent)
                    .with_brand_research(research.clone()),
            )
            .await?;
        let content = self
            .bounded(
                "generate",
                self.collaborators.generator.generate(
                    &research,
                    &campaign.platforms,
                    &campaign.tone,
                    campaign.goal,
                ),
            )
            .await
            .map_err(RunAbort::Stage)?;

        cursor
            .advance(CampaignUpdate::status(CampaignStatus::Critiquing))
            .await?;
        let (content, summary) = self
            .critique_and_refine(campaign.id, &research, content, &campaign.tone)
            .await;

        cursor
            .advance(CampaignUpdate::status(CampaignStatus::GeneratingImages))
            .await?;
        let images = self
            .render_images(campaign.id, &research, &campaign.platforms, &content)
            .await;

        cursor
            .advance(
                CampaignUpdate::status(CampaignStatus::Completed)
                    .with_brand_research(research)
                    .with_generated_content(content)
                    .with_generated_images(images)
                    .with_critique(summary),
            )
            .await
    }

    async fn execute_regeneration(
        &self,
        campaign: &Campaign,
        research: BrandResearch,
        new_tone: Option<String>,
    ) -> Result<(), RunAbort> {
        let mut cursor = StatusCursor::new(self.store.as_ref(), campaign);
        let tone = new_tone.clone().unwrap_or_else(|| campaign.tone.clone());

        cursor
            .restart(CampaignUpdate::status(CampaignStatus::GeneratingContent))
            .await?;
        let content = self
            .bounded(
                "generate",
                self.collaborators.generator.generate(
                    &research,
                    &campaign.platforms,
                    &tone,
                    campaign.goal,
                ),
            )
            .await
            .map_err(RunAbort::Stage)?;

        cursor
            .advance(CampaignUpdate::status(CampaignStatus::Critiquing))
            .await?;
        let (content, summary) = self
            .critique_and_refine(campaign.id, &research, content, &tone)
            .await;

        let mut update = CampaignUpdate::status(CampaignStatus::Completed)
            .with_generated_content(content)
            .with_critique(summary);
        if let Some(tone) = new_tone {
            update = update.with_tone(tone);
        }
        // A completed record always carries an image list.
        if campaign.generated_images.is_none() {
            update = update.with_generated_images(Vec::new());
        }
        cursor.advance(update).await
    }

    // ---- stages ----

    /// Critique then refine; both degrade instead of failing the run.
    async fn critique_and_refine(
        &self,
        id: DbId,
        research: &BrandResearch,
        content: GeneratedContent,
        tone: &str,
    ) -> (GeneratedContent, CritiqueSummary) {
        let critique = match self
            .bounded(
                "critique",
                self.collaborators.critic.critique(research, &content, tone),
            )
            .await
        {
            Ok(critique) => critique,
            Err(e) => {
                tracing::warn!(campaign_id = id, error = %e, "Critique failed, using fallback");
                CritiqueResult::fallback()
            }
        };

        let content = match self
            .bounded(
                "refine",
                self.collaborators
                    .refiner
                    .refine(&content, &critique, research),
            )
            .await
        {
            Ok(refined) => refined,
            Err(e) => {
                tracing::warn!(campaign_id = id, error = %e, "Refinement failed, keeping original content");
                content
            }
        };

        let summary = critique::summarize(critique, &content);
        (content, summary)
    }

    /// Render one image per platform, keeping platform order and omitting
    /// platforms whose render failed.
    async fn render_images(
        &self,
        id: DbId,
        research: &BrandResearch,
        platforms: &[Platform],
        content: &GeneratedContent,
    ) -> Vec<GeneratedImage> {
        let renderer = &self.collaborators.renderer;
        let results: Vec<(Platform, Result<GeneratedImage, StageError>)> =
            futures::stream::iter(platforms.iter().copied().map(|platform| async move {
                let result = self
                    .bounded("image", renderer.render(research, platform, id, content))
                    .await;
                (platform, result)
            }))
            .buffered(self.config.image_concurrency.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(platform, result)| match result {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(
                        campaign_id = id,
                        platform = %platform,
                        error = %e,
                        "Image render failed, omitting platform",
                    );
                    None
                }
            })
            .collect()
    }

    // ---- helpers ----

    /// Fetch the record at run start. `None` ends the run.
    ///
    /// A read error leaves the record as it is; a run stuck mid-stage is
    /// picked up by the stale-campaign sweep.
    async fn load(&self, id: DbId) -> Option<Campaign> {
        match self.store.get(id).await {
            Ok(Some(campaign)) => Some(campaign),
            Ok(None) => {
                tracing::warn!(campaign_id = id, "Campaign not found, nothing to run");
                None
            }
            Err(e) => {
                // The stored status is unknown, so nothing is written back.
                tracing::error!(campaign_id = id, error = %e, "Failed to load campaign");
                None
            }
        }
    }

    /// Apply the configured stage timeout to a collaborator call.
    async fn bounded<T>(
        &self,
        stage: &'static str,
        call: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, StageError> {
        let limit = self.config.stage_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(StageError::Timeout {
                stage,
                secs: limit.as_secs(),
            }),
        }
    }

    async fn finish(&self, id: DbId, result: Result<(), RunAbort>) {
        match result {
            Ok(()) => tracing::info!(campaign_id = id, "Campaign run completed"),
            Err(RunAbort::Stage(e)) => self.mark_failed(id, &e.to_string()).await,
            Err(RunAbort::Store(e)) => {
                tracing::error!(campaign_id = id, error = %e, "Store write failed during run");
                self.mark_failed(id, STORAGE_ERROR_MESSAGE).await;
            }
            Err(RunAbort::IllegalTransition { from, to }) => {
                tracing::error!(campaign_id = id, %from, %to, "Illegal status transition");
                self.mark_failed(id, &format!("Illegal status transition from {from} to {to}"))
                    .await;
            }
            Err(RunAbort::Missing) => {
                tracing::warn!(campaign_id = id, "Campaign deleted during run");
            }
        }
    }
}
