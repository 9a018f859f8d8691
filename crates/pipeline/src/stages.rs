//! Stage collaborator contracts.
//!
//! Each stage is an async trait so the orchestrator can run against the
//! HTTP-backed clients in production and in-process stubs in tests.

use std::sync::Arc;

use adflow_core::campaign::{BrandResearch, GeneratedContent, GeneratedImage, Goal, Platform};
use adflow_core::critique::CritiqueResult;
use adflow_core::types::DbId;
use async_trait::async_trait;

use crate::error::StageError;

/// Learns about a brand from its website.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, website_url: &str) -> Result<BrandResearch, StageError>;
}

/// Produces platform copy for a campaign.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        research: &BrandResearch,
        platforms: &[Platform],
        tone: &str,
        goal: Goal,
    ) -> Result<GeneratedContent, StageError>;
}

/// Reviews generated copy.
#[async_trait]
pub trait Critic: Send + Sync {
    async fn critique(
        &self,
        research: &BrandResearch,
        content: &GeneratedContent,
        tone: &str,
    ) -> Result<CritiqueResult, StageError>;
}

/// Rewrites copy using critic feedback.
#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(
        &self,
        content: &GeneratedContent,
        critique: &CritiqueResult,
        research: &BrandResearch,
    ) -> Result<GeneratedContent, StageError>;
}

/// Renders one ad image for a platform.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(
        &self,
        research: &BrandResearch,
        platform: Platform,
        campaign_id: DbId,
        content: &GeneratedContent,
    ) -> Result<GeneratedImage, StageError>;
}

/// The full set of collaborators a run needs.
#[derive(Clone)]
pub struct Collaborators {
    pub researcher: Arc<dyn Researcher>,
    pub generator: Arc<dyn ContentGenerator>,
    pub critic: Arc<dyn Critic>,
    pub refiner: Arc<dyn Refiner>,
    pub renderer: Arc<dyn ImageRenderer>,
}
