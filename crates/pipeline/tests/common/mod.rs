//! Shared stubs for pipeline integration tests.
//!
//! Every collaborator is an in-process stub whose failure mode is set per
//! test; [`RecordingStore`] wraps the in-memory store to capture the status
//! sequence a run writes and optionally inject a store failure.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adflow_core::campaign::{
    BrandResearch, CampaignStatus, GeneratedContent, GeneratedImage, Goal, InstagramContent,
    InstagramPost, LinkedinContent, Platform, TwitterContent,
};
use adflow_core::critique::CritiqueResult;
use adflow_core::types::{DbId, Timestamp};
use adflow_db::models::campaign::{Campaign, CampaignUpdate, CreateCampaign};
use adflow_db::{CampaignStore, InMemoryCampaignStore, StoreBackend, StoreError};
use adflow_pipeline::stages::{ContentGenerator, Critic, ImageRenderer, Refiner, Researcher};
use adflow_pipeline::{
    CampaignDispatcher, CampaignOrchestrator, Collaborators, PipelineConfig, StageError,
};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn research() -> BrandResearch {
    BrandResearch {
        brand_name: "Acme".to_string(),
        tagline: Some("Everything, delivered".to_string()),
        description: "Mail-order everything for the discerning coyote".to_string(),
        features: vec!["Rocket skates".to_string()],
        positioning: "Premium positioning".to_string(),
        target_audience: "Desert predators".to_string(),
        tone_of_voice: "Deadpan".to_string(),
        value_propositions: vec!["Ships overnight".to_string()],
    }
}

/// Content that meets every platform's completeness threshold.
pub fn full_content() -> GeneratedContent {
    GeneratedContent {
        instagram: Some(InstagramContent {
            post_ideas: (1..=3)
                .map(|i| InstagramPost {
                    slogan: format!("Slogan {i}"),
                    caption: format!("Caption {i}"),
                    hashtags: vec!["#acme".to_string()],
                })
                .collect(),
        }),
        linkedin: Some(LinkedinContent {
            email_templates: vec!["Hello".to_string()],
            post_drafts: vec!["Draft 1".to_string(), "Draft 2".to_string()],
        }),
        twitter: Some(TwitterContent {
            ad_lines: (1..=5).map(|i| format!("Line {i}")).collect(),
        }),
    }
}

pub fn sample_critique() -> CritiqueResult {
    CritiqueResult {
        strengths: vec!["Clear call to action".to_string(), "On brand".to_string()],
        weaknesses: vec!["Captions run long".to_string()],
        suggestions: vec!["Shorten captions".to_string()],
    }
}

pub fn new_campaign(platforms: Vec<Platform>) -> CreateCampaign {
    CreateCampaign {
        owner_id: 1,
        website_url: "https://acme.test".to_string(),
        platforms,
        tone: "playful".to_string(),
        goal: Goal::Awareness,
    }
}

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubResearcher {
    pub fail: Option<String>,
    pub panic: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Researcher for StubResearcher {
    async fn research(&self, _website_url: &str) -> Result<BrandResearch, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic {
            panic!("scraper exploded");
        }
        match &self.fail {
            Some(message) => Err(StageError::failed(message.clone())),
            None => Ok(research()),
        }
    }
}

#[derive(Default)]
pub struct StubGenerator {
    pub fail: Option<String>,
    pub tones: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(
        &self,
        _research: &BrandResearch,
        platforms: &[Platform],
        tone: &str,
        _goal: Goal,
    ) -> Result<GeneratedContent, StageError> {
        self.tones.lock().unwrap().push(tone.to_string());
        if let Some(message) = &self.fail {
            return Err(StageError::failed(message.clone()));
        }
        let mut content = full_content();
        if !platforms.contains(&Platform::Instagram) {
            content.instagram = None;
        }
        if !platforms.contains(&Platform::Linkedin) {
            content.linkedin = None;
        }
        if !platforms.contains(&Platform::Twitter) {
            content.twitter = None;
        }
        Ok(content)
    }
}

#[derive(Default)]
pub struct StubCritic {
    pub fail: bool,
}

#[async_trait]
impl Critic for StubCritic {
    async fn critique(
        &self,
        _research: &BrandResearch,
        _content: &GeneratedContent,
        _tone: &str,
    ) -> Result<CritiqueResult, StageError> {
        if self.fail {
            return Err(StageError::failed("critic unavailable"));
        }
        Ok(sample_critique())
    }
}

/// Prefixes every twitter ad line with `Refined: ` so tests can tell
/// refined content from the original.
#[derive(Default)]
pub struct StubRefiner {
    pub fail: bool,
}

#[async_trait]
impl Refiner for StubRefiner {
    async fn refine(
        &self,
        content: &GeneratedContent,
        _critique: &CritiqueResult,
        _research: &BrandResearch,
    ) -> Result<GeneratedContent, StageError> {
        if self.fail {
            return Err(StageError::failed("refiner unavailable"));
        }
        let mut refined = content.clone();
        if let Some(twitter) = refined.twitter.as_mut() {
            for line in &mut twitter.ad_lines {
                *line = format!("Refined: {line}");
            }
        }
        Ok(refined)
    }
}

#[derive(Default)]
pub struct StubRenderer {
    pub fail_for: Vec<Platform>,
}

#[async_trait]
impl ImageRenderer for StubRenderer {
    async fn render(
        &self,
        _research: &BrandResearch,
        platform: Platform,
        campaign_id: DbId,
        _content: &GeneratedContent,
    ) -> Result<GeneratedImage, StageError> {
        if self.fail_for.contains(&platform) {
            return Err(StageError::Api {
                status: 500,
                body: "render failed".to_string(),
            });
        }
        Ok(GeneratedImage {
            platform,
            url: format!("/generated-images/{campaign_id}-{platform}.png"),
            width: 1024,
            height: 512,
        })
    }
}

/// Individually replaceable stubs, assembled into [`Collaborators`].
pub struct Stubs {
    pub researcher: Arc<StubResearcher>,
    pub generator: Arc<StubGenerator>,
    pub critic: Arc<StubCritic>,
    pub refiner: Arc<StubRefiner>,
    pub renderer: Arc<StubRenderer>,
}

impl Default for Stubs {
    fn default() -> Self {
        Self {
            researcher: Arc::new(StubResearcher::default()),
            generator: Arc::new(StubGenerator::default()),
            critic: Arc::new(StubCritic::default()),
            refiner: Arc::new(StubRefiner::default()),
            renderer: Arc::new(StubRenderer::default()),
        }
    }
}

impl Stubs {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            researcher: self.researcher.clone(),
            generator: self.generator.clone(),
            critic: self.critic.clone(),
            refiner: self.refiner.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recording store
// ---------------------------------------------------------------------------

/// In-memory store that records every status written through `update`.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryCampaignStore,
    statuses: Mutex<Vec<CampaignStatus>>,
    /// Writes of this status fail with a store error.
    pub fail_on_status: Option<CampaignStatus>,
    /// While set, every `get` fails with a store error.
    fail_reads: AtomicBool,
}

impl RecordingStore {
    pub fn failing_on(status: CampaignStatus) -> Self {
        Self {
            fail_on_status: Some(status),
            ..Default::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn statuses(&self) -> Vec<CampaignStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn clear_statuses(&self) {
        self.statuses.lock().unwrap().clear();
    }
}

#[async_trait]
impl CampaignStore for RecordingStore {
    fn backend(&self) -> StoreBackend {
        self.inner.backend()
    }

    async fn create(&self, input: &CreateCampaign) -> Result<Campaign, StoreError> {
        self.inner.create(input).await
    }

    async fn get(&self, id: DbId) -> Result<Option<Campaign>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("injected read failure".to_string()));
        }
        self.inner.get(id).await
    }

    async fn update(
        &self,
        id: DbId,
        update: &CampaignUpdate,
    ) -> Result<Option<Campaign>, StoreError> {
        if let Some(status) = update.status {
            if self.fail_on_status == Some(status) {
                return Err(StoreError::Corrupt("injected failure".to_string()));
            }
            self.statuses.lock().unwrap().push(status);
        }
        self.inner.update(id, update).await
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Campaign>, StoreError> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Campaign>, StoreError> {
        self.inner.list_stale(cutoff).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<RecordingStore>,
    pub orchestrator: Arc<CampaignOrchestrator>,
    pub dispatcher: CampaignDispatcher,
}

impl Harness {
    pub fn new(stubs: &Stubs) -> Self {
        Self::with(stubs, RecordingStore::default(), PipelineConfig::default())
    }

    pub fn with(stubs: &Stubs, store: RecordingStore, config: PipelineConfig) -> Self {
        let store = Arc::new(store);
        let orchestrator = Arc::new(CampaignOrchestrator::new(
            store.clone(),
            stubs.collaborators(),
            config,
        ));
        let dispatcher = CampaignDispatcher::new(orchestrator.clone());
        Self {
            store,
            orchestrator,
            dispatcher,
        }
    }

    pub async fn create(&self, platforms: Vec<Platform>) -> Campaign {
        self.store.create(&new_campaign(platforms)).await.unwrap()
    }

    pub async fn get(&self, id: DbId) -> Campaign {
        self.store.get(id).await.unwrap().expect("campaign exists")
    }

    /// Poll until the campaign reaches a terminal status.
    pub async fn wait_for_terminal(&self, id: DbId) -> Campaign {
        for _ in 0..500 {
            let campaign = self.get(id).await;
            if campaign.status.is_terminal() {
                return campaign;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("campaign {id} never reached a terminal status");
    }

    /// Poll until the dispatcher has released the campaign's run slot.
    pub async fn wait_until_idle(&self, id: DbId) {
        for _ in 0..500 {
            if !self.dispatcher.is_running(id).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("campaign {id} run never released");
    }
}
