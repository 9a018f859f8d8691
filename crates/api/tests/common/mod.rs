//! Shared helpers for API integration tests.
//!
//! The app is built with the in-memory store and in-process stub
//! collaborators, so no database or outbound network is needed.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adflow_api::auth::jwt::{generate_access_token, JwtConfig, ROLE_USER};
use adflow_api::config::ServerConfig;
use adflow_api::router::build_app_router;
use adflow_api::state::AppState;
use adflow_core::campaign::{
    BrandResearch, GeneratedContent, GeneratedImage, Goal, Platform, TwitterContent,
};
use adflow_core::critique::CritiqueResult;
use adflow_core::types::DbId;
use adflow_db::models::campaign::Campaign;
use adflow_db::{CampaignStore, InMemoryCampaignStore};
use adflow_pipeline::stages::{ContentGenerator, Critic, ImageRenderer, Refiner, Researcher};
use adflow_pipeline::{
    CampaignDispatcher, CampaignOrchestrator, Collaborators, PipelineConfig, StageError,
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Research stub; `delay` keeps a run active long enough to race against.
#[derive(Default)]
pub struct StubResearcher {
    pub fail: Option<String>,
    pub delay: Option<Duration>,
}

#[async_trait]
impl Researcher for StubResearcher {
    async fn research(&self, _website_url: &str) -> Result<BrandResearch, StageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail {
            return Err(StageError::failed(message.clone()));
        }
        Ok(BrandResearch {
            brand_name: "Acme".to_string(),
            tagline: None,
            description: "Mail-order everything".to_string(),
            features: vec![],
            positioning: "Premium positioning".to_string(),
            target_audience: "Coyotes".to_string(),
            tone_of_voice: "Deadpan".to_string(),
            value_propositions: vec![],
        })
    }
}

/// Echoes the requested tone into a single twitter line.
pub struct EchoGenerator;

#[async_trait]
impl ContentGenerator for EchoGenerator {
    async fn generate(
        &self,
        _research: &BrandResearch,
        _platforms: &[Platform],
        tone: &str,
        _goal: Goal,
    ) -> Result<GeneratedContent, StageError> {
        Ok(GeneratedContent {
            twitter: Some(TwitterContent {
                ad_lines: vec![format!("A {tone} line")],
            }),
            ..Default::default()
        })
    }
}

pub struct StubCritic;

#[async_trait]
impl Critic for StubCritic {
    async fn critique(
        &self,
        _research: &BrandResearch,
        _content: &GeneratedContent,
        _tone: &str,
    ) -> Result<CritiqueResult, StageError> {
        Ok(CritiqueResult {
            strengths: vec!["Punchy".to_string()],
            weaknesses: vec![],
            suggestions: vec![],
        })
    }
}

pub struct PassthroughRefiner;

#[async_trait]
impl Refiner for PassthroughRefiner {
    async fn refine(
        &self,
        content: &GeneratedContent,
        _critique: &CritiqueResult,
        _research: &BrandResearch,
    ) -> Result<GeneratedContent, StageError> {
        Ok(content.clone())
    }
}

pub struct StubRenderer;

#[async_trait]
impl ImageRenderer for StubRenderer {
    async fn render(
        &self,
        _research: &BrandResearch,
        platform: Platform,
        campaign_id: DbId,
        _content: &GeneratedContent,
    ) -> Result<GeneratedImage, StageError> {
        Ok(GeneratedImage {
            platform,
            url: format!("/generated-images/{campaign_id}-{platform}.png"),
            width: 1024,
            height: 512,
        })
    }
}

pub fn collaborators(researcher: StubResearcher) -> Collaborators {
    Collaborators {
        researcher: Arc::new(researcher),
        generator: Arc::new(EchoGenerator),
        critic: Arc::new(StubCritic),
        refiner: Arc::new(PassthroughRefiner),
        renderer: Arc::new(StubRenderer),
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        stale_campaign_minutes: 60,
        stale_check_interval_secs: 300,
        images_dir: PathBuf::from("./target/test-generated-images"),
        images_url_prefix: "/generated-images".to_string(),
        jwt: JwtConfig {
            secret: "adflow-api-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// A built router plus handles on the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn token_for(&self, user_id: DbId) -> String {
        generate_access_token(user_id, ROLE_USER, &self.state.config.jwt)
            .expect("token generation")
    }

    pub async fn stored(&self, id: DbId) -> Campaign {
        self.state
            .store
            .get(id)
            .await
            .unwrap()
            .expect("campaign exists")
    }

    /// Poll the store until the campaign reaches a terminal status and its
    /// run slot is released.
    pub async fn wait_for_terminal(&self, id: DbId) -> Campaign {
        for _ in 0..500 {
            let campaign = self.stored(id).await;
            if campaign.status.is_terminal() && !self.state.dispatcher.is_running(id).await {
                return campaign;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("campaign {id} never settled");
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(StubResearcher::default())
}

pub fn build_test_app_with(researcher: StubResearcher) -> TestApp {
    let config = test_config();
    let store: Arc<dyn CampaignStore> = Arc::new(InMemoryCampaignStore::new());
    let orchestrator = Arc::new(CampaignOrchestrator::new(
        Arc::clone(&store),
        collaborators(researcher),
        PipelineConfig::default(),
    ));
    let state = AppState {
        store,
        dispatcher: Arc::new(CampaignDispatcher::new(orchestrator)),
        config: Arc::new(config.clone()),
    };
    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Create a campaign through the API and return its id.
pub async fn create_campaign(app: &TestApp, token: &str, tone: &str) -> DbId {
    let response = post_json_auth(
        app,
        "/api/v1/campaigns",
        serde_json::json!({
            "website_url": "acme.test",
            "platforms": ["twitter", "instagram"],
            "tone": tone,
            "goal": "awareness",
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("created campaign has an id")
}
