//! HTTP-backed stage collaborators.
//!
//! - [`scraper::WebResearcher`] -- fetches a brand site and extracts research.
//! - [`llm::LlmClient`] -- OpenAI-compatible chat client for generate,
//!   critique and refine.
//! - [`image::StabilityImageRenderer`] -- text-to-image renderer with a
//!   placeholder fallback.

use std::sync::Arc;

use crate::config::ClientsConfig;
use crate::error::StageError;
use crate::stages::Collaborators;

pub mod image;
pub mod llm;
pub mod scraper;

pub use image::StabilityImageRenderer;
pub use llm::LlmClient;
pub use scraper::WebResearcher;

/// Build the production collaborator set sharing one HTTP client.
pub fn build_collaborators(config: &ClientsConfig) -> Result<Collaborators, StageError> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let llm = Arc::new(LlmClient::with_client(
        http.clone(),
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));

    Ok(Collaborators {
        researcher: Arc::new(WebResearcher::with_client(http.clone())),
        generator: llm.clone(),
        critic: llm.clone(),
        refiner: llm,
        renderer: Arc::new(StabilityImageRenderer::with_client(
            http,
            config.image_api_url.clone(),
            config.image_api_key.clone(),
            config.images_dir.clone(),
            config.images_url_prefix.clone(),
        )),
    })
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`StageError::Api`] containing the status and
/// body text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, StageError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StageError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
