//! Stability text-to-image renderer.
//!
//! Without an API key every render returns the platform's static
//! placeholder. With a key, the first returned artifact is decoded from
//! base64 and written into the images directory.

use std::path::PathBuf;

use adflow_core::campaign::{BrandResearch, GeneratedContent, GeneratedImage, Platform};
use adflow_core::types::DbId;
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::error::StageError;
use crate::stages::ImageRenderer;

const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted, ugly, low resolution, watermark";
const CFG_SCALE: f32 = 7.0;
const STEPS: u32 = 30;
/// Characters of the brand description included in the prompt.
const PROMPT_DESCRIPTION_LEN: usize = 150;

/// Output size for a platform's ad image, as `(width, height)`.
pub fn platform_dimensions(platform: Platform) -> (u32, u32) {
    match platform {
        Platform::Instagram => (1024, 1024),
        Platform::Linkedin | Platform::Twitter => (1024, 512),
    }
}

/// Static image served when no renderer is configured.
pub fn placeholder_url(platform: Platform) -> String {
    format!("/placeholders/{platform}-placeholder.png")
}

fn style_for(platform: Platform) -> &'static str {
    match platform {
        Platform::Instagram => "vibrant, eye-catching, modern design with bold colors",
        Platform::Linkedin => "professional, corporate, clean business aesthetic",
        Platform::Twitter => "bold, minimalist, attention-grabbing design",
    }
}

/// Build the text prompt for one platform image.
pub fn image_prompt(
    research: &BrandResearch,
    platform: Platform,
    content: &GeneratedContent,
) -> String {
    let description: String = research
        .description
        .chars()
        .take(PROMPT_DESCRIPTION_LEN)
        .collect();
    let theme = content
        .headline_for(platform)
        .map(|h| format!(" Theme: {h}."))
        .unwrap_or_default();

    format!(
        "Professional {platform} ad banner for {name}. {description}.{theme} {style}, {positioning}. \
         High quality, professional marketing material, sharp focus, detailed, \
         commercial photography style, no text or letters",
        name = research.brand_name,
        style = style_for(platform),
        positioning = research.positioning,
    )
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: [TextPrompt<'a>; 2],
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
}

/// [`ImageRenderer`] backed by the Stability REST API.
pub struct StabilityImageRenderer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    output_dir: PathBuf,
    url_prefix: String,
}

impl StabilityImageRenderer {
    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        api_key: Option<String>,
        output_dir: PathBuf,
        url_prefix: String,
    ) -> Self {
        Self {
            client,
            api_url,
            api_key,
            output_dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// A renderer that only ever returns placeholders.
    pub fn placeholder_only() -> Self {
        Self::with_client(
            reqwest::Client::new(),
            String::new(),
            None,
            PathBuf::new(),
            String::new(),
        )
    }

    async fn request_image(
        &self,
        api_key: &str,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, StageError> {
        let request = TextToImageRequest {
            text_prompts: [
                TextPrompt {
                    text: prompt,
                    weight: 1.0,
                },
                TextPrompt {
                    text: NEGATIVE_PROMPT,
                    weight: -1.0,
                },
            ],
            cfg_scale: CFG_SCALE,
            height,
            width,
            samples: 1,
            steps: STEPS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;
        let body: TextToImageResponse = ensure_success(response).await?.json().await?;

        let artifact = body
            .artifacts
            .into_iter()
            .next()
            .ok_or_else(|| StageError::InvalidResponse("Image API returned no artifacts".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(artifact.base64.as_bytes())
            .map_err(|e| StageError::InvalidResponse(format!("Invalid image payload: {e}")))
    }
}

#[async_trait]
impl ImageRenderer for StabilityImageRenderer {
    async fn render(
        &self,
        research: &BrandResearch,
        platform: Platform,
        campaign_id: DbId,
        content: &GeneratedContent,
    ) -> Result<GeneratedImage, StageError> {
        let (width, height) = platform_dimensions(platform);

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(GeneratedImage {
                platform,
                url: placeholder_url(platform),
                width,
                height,
            });
        };

        let prompt = image_prompt(research, platform, content);
        let bytes = self.request_image(api_key, &prompt, width, height).await?;

        let file_name = format!(
            "{campaign_id}-{platform}-{}.png",
            chrono::Utc::now().timestamp_millis()
        );
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(self.output_dir.join(&file_name), &bytes).await?;
        tracing::debug!(campaign_id, platform = %platform, file_name = %file_name, "Saved rendered image");

        Ok(GeneratedImage {
            platform,
            url: format!("{}/{file_name}", self.url_prefix),
            width,
            height,
        })
    }
}
