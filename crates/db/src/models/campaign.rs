//! Campaign entity model and DTOs.

use adflow_core::campaign::{
    BrandResearch, CampaignStatus, GeneratedContent, GeneratedImage, Goal, Platform, StatusId,
};
use adflow_core::critique::CritiqueSummary;
use adflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A stored campaign record.
///
/// Result fields are only meaningful once `status` is
/// [`CampaignStatus::Completed`]; during a run they may be partially filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: DbId,
    pub owner_id: DbId,
    pub website_url: String,
    pub platforms: Vec<Platform>,
    pub tone: String,
    pub goal: Goal,
    pub status: CampaignStatus,
    pub brand_research: Option<BrandResearch>,
    pub generated_content: Option<GeneratedContent>,
    pub generated_images: Option<Vec<GeneratedImage>>,
    pub critique: Option<CritiqueSummary>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    /// Build a fresh `pending` record from a create DTO.
    pub fn new(id: DbId, input: &CreateCampaign, now: Timestamp) -> Self {
        Self {
            id,
            owner_id: input.owner_id,
            website_url: input.website_url.clone(),
            platforms: input.platforms.clone(),
            tone: input.tone.clone(),
            goal: input.goal,
            status: CampaignStatus::Pending,
            brand_research: None,
            generated_content: None,
            generated_images: None,
            critique: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this record and bump `updated_at`.
    ///
    /// Writing any non-failed status clears `error_message`; writing
    /// `Failed` stores the patch's message.
    pub fn apply(&mut self, update: &CampaignUpdate, now: Timestamp) {
        if let Some(status) = update.status {
            self.status = status;
            self.error_message = if status == CampaignStatus::Failed {
                update.error_message.clone()
            } else {
                None
            };
        }
        if let Some(tone) = &update.tone {
            self.tone = tone.clone();
        }
        if let Some(research) = &update.brand_research {
            self.brand_research = Some(research.clone());
        }
        if let Some(content) = &update.generated_content {
            self.generated_content = Some(content.clone());
        }
        if let Some(images) = &update.generated_images {
            self.generated_images = Some(images.clone());
        }
        if let Some(critique) = &update.critique {
            self.critique = Some(critique.clone());
        }
        self.updated_at = now;
    }
}

/// A row from the `campaigns` table.
///
/// JSONB payload columns are decoded through [`Json`]; conversion into
/// [`Campaign`] validates the status id and goal label.
#[derive(Debug, FromRow)]
pub struct CampaignRow {
    pub id: DbId,
    pub owner_id: DbId,
    pub website_url: String,
    pub platforms: Json<Vec<Platform>>,
    pub tone: String,
    pub goal: String,
    pub status_id: StatusId,
    pub brand_research: Option<Json<BrandResearch>>,
    pub generated_content: Option<Json<GeneratedContent>>,
    pub generated_images: Option<Json<Vec<GeneratedImage>>>,
    pub critique: Option<Json<CritiqueSummary>>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = adflow_core::error::CoreError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            website_url: row.website_url,
            platforms: row.platforms.0,
            tone: row.tone,
            goal: row.goal.parse()?,
            status: CampaignStatus::try_from(row.status_id)?,
            brand_research: row.brand_research.map(|j| j.0),
            generated_content: row.generated_content.map(|j| j.0),
            generated_images: row.generated_images.map(|j| j.0),
            critique: row.critique.map(|j| j.0),
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for inserting a new campaign. Fields are expected to be validated
/// and normalized by the caller.
#[derive(Debug, Clone)]
pub struct CreateCampaign {
    pub owner_id: DbId,
    pub website_url: String,
    pub platforms: Vec<Platform>,
    pub tone: String,
    pub goal: Goal,
}

/// Table check tying `error_message` to the `failed` status.
pub const ERROR_IFF_FAILED_CONSTRAINT: &str = "ck_campaigns_error_iff_failed";

/// Partial update. `None` fields are left untouched.
///
/// `error_message` is only honored together with `status: Some(Failed)`.
#[derive(Debug, Clone, Default)]
pub struct CampaignUpdate {
    pub status: Option<CampaignStatus>,
    pub tone: Option<String>,
    pub brand_research: Option<BrandResearch>,
    pub generated_content: Option<GeneratedContent>,
    pub generated_images: Option<Vec<GeneratedImage>>,
    pub critique: Option<CritiqueSummary>,
    pub error_message: Option<String>,
}

impl CampaignUpdate {
    /// A bare status transition.
    pub fn status(status: CampaignStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Transition to `Failed` with a human-readable message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(CampaignStatus::Failed),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// The table check this patch would break, if any.
    ///
    /// A `Failed` status without a message can never be stored.
    pub fn violated_constraint(&self) -> Option<&'static str> {
        match (self.status, &self.error_message) {
            (Some(CampaignStatus::Failed), None) => Some(ERROR_IFF_FAILED_CONSTRAINT),
            _ => None,
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_brand_research(mut self, research: BrandResearch) -> Self {
        self.brand_research = Some(research);
        self
    }

    pub fn with_generated_content(mut self, content: GeneratedContent) -> Self {
        self.generated_content = Some(content);
        self
    }

    pub fn with_generated_images(mut self, images: Vec<GeneratedImage>) -> Self {
        self.generated_images = Some(images);
        self
    }

    pub fn with_critique(mut self, critique: CritiqueSummary) -> Self {
        self.critique = Some(critique);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample() -> Campaign {
        let input = CreateCampaign {
            owner_id: 9,
            website_url: "https://example.com".into(),
            platforms: vec![Platform::Instagram],
            tone: "bold".into(),
            goal: Goal::Awareness,
        };
        Campaign::new(1, &input, Utc::now())
    }

    #[test]
    fn new_campaign_is_pending_and_empty() {
        let campaign = sample();
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert!(campaign.brand_research.is_none());
        assert!(campaign.error_message.is_none());
        assert_eq!(campaign.created_at, campaign.updated_at);
    }

    #[test]
    fn apply_failed_sets_message_and_bumps_updated_at() {
        let mut campaign = sample();
        let later = campaign.updated_at + Duration::seconds(5);
        campaign.apply(&CampaignUpdate::failed("rate limited"), later);

        assert_eq!(campaign.status, CampaignStatus::Failed);
        assert_eq!(campaign.error_message.as_deref(), Some("rate limited"));
        assert_eq!(campaign.updated_at, later);
    }

    #[test]
    fn apply_non_failed_status_clears_message() {
        let mut campaign = sample();
        campaign.apply(&CampaignUpdate::failed("boom"), Utc::now());
        campaign.apply(
            &CampaignUpdate::status(CampaignStatus::GeneratingContent),
            Utc::now(),
        );
        assert!(campaign.error_message.is_none());
    }

    #[test]
    fn apply_ignores_message_without_failed_status() {
        let mut campaign = sample();
        let update = CampaignUpdate {
            error_message: Some("ignored".into()),
            ..Default::default()
        };
        campaign.apply(&update, Utc::now());
        assert!(campaign.error_message.is_none());
        assert_eq!(campaign.status, CampaignStatus::Pending);
    }

    #[test]
    fn apply_leaves_unset_fields_untouched() {
        let mut campaign = sample();
        campaign.apply(&CampaignUpdate::default().with_tone("calm"), Utc::now());
        assert_eq!(campaign.tone, "calm");
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert!(campaign.generated_images.is_none());
    }

    #[test]
    fn only_failed_without_message_violates_constraint() {
        assert_eq!(
            CampaignUpdate::status(CampaignStatus::Failed).violated_constraint(),
            Some(ERROR_IFF_FAILED_CONSTRAINT)
        );
        assert_eq!(CampaignUpdate::failed("boom").violated_constraint(), None);
        assert_eq!(
            CampaignUpdate::status(CampaignStatus::Completed).violated_constraint(),
            None
        );
        assert_eq!(CampaignUpdate::default().violated_constraint(), None);
    }
}
