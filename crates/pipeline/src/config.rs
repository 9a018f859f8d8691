//! Pipeline and collaborator configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default per-stage timeout in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;

/// Default number of platform images rendered at once. Three covers every
/// platform, so a run renders all of its images concurrently.
pub const DEFAULT_IMAGE_CONCURRENCY: usize = 3;

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on every collaborator call.
    pub stage_timeout: Duration,
    /// Maximum concurrent image renders within one run.
    pub image_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            image_concurrency: DEFAULT_IMAGE_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `PIPELINE_STAGE_TIMEOUT_SECS` | `120`   |
    /// | `IMAGE_RENDER_CONCURRENCY`    | `3`     |
    pub fn from_env() -> Self {
        let stage_timeout_secs: u64 = std::env::var("PIPELINE_STAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_STAGE_TIMEOUT_SECS.to_string())
            .parse()
            .expect("PIPELINE_STAGE_TIMEOUT_SECS must be a valid u64");

        let image_concurrency: usize = std::env::var("IMAGE_RENDER_CONCURRENCY")
            .unwrap_or_else(|_| DEFAULT_IMAGE_CONCURRENCY.to_string())
            .parse()
            .expect("IMAGE_RENDER_CONCURRENCY must be a valid usize");

        Self {
            stage_timeout: Duration::from_secs(stage_timeout_secs),
            image_concurrency: image_concurrency.max(1),
        }
    }
}

/// Settings for the HTTP-backed collaborators in [`crate::clients`].
#[derive(Debug, Clone)]
pub struct ClientsConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Stability text-to-image endpoint.
    pub image_api_url: String,
    /// Without a key the renderer returns placeholder images.
    pub image_api_key: Option<String>,
    /// Directory rendered images are written to.
    pub images_dir: PathBuf,
    /// URL prefix under which `images_dir` is served.
    pub images_url_prefix: String,
    /// Timeout for individual outbound HTTP requests.
    pub http_timeout: Duration,
}

impl ClientsConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                   |
    /// |-------------------------|-------------------------------------------|
    /// | `LLM_API_URL`           | `https://api.openai.com/v1`               |
    /// | `LLM_API_KEY`           | unset                                     |
    /// | `LLM_MODEL`             | `gpt-4o-mini`                             |
    /// | `STABILITY_API_URL`     | Stability SDXL text-to-image endpoint     |
    /// | `STABILITY_API_KEY`     | unset (placeholder images)                |
    /// | `GENERATED_IMAGES_DIR`  | `./generated-images`                      |
    /// | `GENERATED_IMAGES_URL`  | `/generated-images`                       |
    /// | `HTTP_CLIENT_TIMEOUT_SECS` | `60`                                   |
    pub fn from_env() -> Self {
        let http_timeout_secs: u64 = std::env::var("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("HTTP_CLIENT_TIMEOUT_SECS must be a valid u64");

        Self {
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            llm_api_key: non_empty_var("LLM_API_KEY"),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            image_api_url: std::env::var("STABILITY_API_URL").unwrap_or_else(|_| {
                "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image"
                    .into()
            }),
            image_api_key: non_empty_var("STABILITY_API_KEY"),
            images_dir: std::env::var("GENERATED_IMAGES_DIR")
                .unwrap_or_else(|_| "./generated-images".into())
                .into(),
            images_url_prefix: std::env::var("GENERATED_IMAGES_URL")
                .unwrap_or_else(|_| "/generated-images".into()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
