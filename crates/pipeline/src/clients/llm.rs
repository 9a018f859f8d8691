//! OpenAI-compatible chat completions client.
//!
//! One client backs three stages (generate, critique, refine). Every call
//! requests a JSON object response and deserializes it into the stage's
//! output type.

use adflow_core::campaign::{BrandResearch, GeneratedContent, Goal, Platform};
use adflow_core::critique::CritiqueResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::error::StageError;
use crate::stages::{ContentGenerator, Critic, Refiner};

const SYSTEM_PROMPT: &str = "You are an expert marketing assistant that writes high-quality \
    ad content. Always respond with a single valid JSON object.";

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 4000;

/// Chat client for an OpenAI-compatible API.
pub struct LlmClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// * `api_url` - Base URL, e.g. `https://api.openai.com/v1`.
    pub fn new(api_url: String, api_key: Option<String>, model: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key, model)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Send a prompt and decode the JSON object in the reply.
    async fn complete_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, StageError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            StageError::failed("No LLM provider configured. Set LLM_API_KEY")
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let reply: ChatResponse = ensure_success(response).await?.json().await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| StageError::InvalidResponse("LLM returned no content".into()))?;
        parse_json_reply(&content)
    }
}

/// Decode a model reply, tolerating a Markdown code fence around the JSON.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, StageError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim())
        .map_err(|e| StageError::InvalidResponse(format!("LLM reply is not valid JSON: {e}")))
}

/// Keep only the sections for the requested platforms.
fn retain_platforms(mut content: GeneratedContent, platforms: &[Platform]) -> GeneratedContent {
    if !platforms.contains(&Platform::Instagram) {
        content.instagram = None;
    }
    if !platforms.contains(&Platform::Linkedin) {
        content.linkedin = None;
    }
    if !platforms.contains(&Platform::Twitter) {
        content.twitter = None;
    }
    content
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// ---- prompts ----

fn brand_block(research: &BrandResearch) -> String {
    format!(
        "Brand Information:\n\
         - Name: {}\n\
         - Tagline: {}\n\
         - Description: {}\n\
         - Key Features: {}\n\
         - Positioning: {}\n\
         - Target Audience: {}\n\
         - Tone of Voice: {}\n\
         - Value Propositions: {}",
        research.brand_name,
        research.tagline.as_deref().unwrap_or("N/A"),
        research.description,
        research.features.join(", "),
        research.positioning,
        research.target_audience,
        research.tone_of_voice,
        research.value_propositions.join(", "),
    )
}

fn generate_prompt(
    research: &BrandResearch,
    platforms: &[Platform],
    tone: &str,
    goal: Goal,
) -> String {
    let mut sections = Vec::new();
    if platforms.contains(&Platform::Instagram) {
        sections.push(
            r#"  "instagram": { "post_ideas": [ { "slogan": "5-8 words", "caption": "100-150 words", "hashtags": ["10-15 hashtags"] } ] }   (3-5 post ideas)"#,
        );
    }
    if platforms.contains(&Platform::Linkedin) {
        sections.push(
            r#"  "linkedin": { "email_templates": ["2 outreach emails"], "post_drafts": ["3 posts of 150-200 words"] }"#,
        );
    }
    if platforms.contains(&Platform::Twitter) {
        sections.push(r#"  "twitter": { "ad_lines": ["5-10 lines, max 280 chars each"] }"#);
    }
    let platform_list: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();

    format!(
        "You are a senior performance marketer specializing in multi-platform ad campaigns.\n\n\
         {brand}\n\n\
         Campaign Parameters:\n\
         - Desired Tone: {tone}\n\
         - Primary Goal: {goal}\n\
         - Target Platforms: {platforms}\n\n\
         Return a JSON object with exactly these keys:\n{{\n{sections}\n}}\n\n\
         The copy must match the brand's positioning and tone, speak to the target \
         audience, and optimize for the {goal} goal.",
        brand = brand_block(research),
        platforms = platform_list.join(", "),
        sections = sections.join(",\n"),
    )
}

fn critique_prompt(research: &BrandResearch, content: &GeneratedContent, tone: &str) -> String {
    format!(
        "You are a senior marketing performance analyst. Review this ad campaign.\n\n\
         Brand: {name}\n\
         Brand Description: {description}\n\
         Target Audience: {audience}\n\
         Desired Tone: {tone}\n\n\
         Generated Content:\n{content}\n\n\
         Respond with a JSON object: \
         {{ \"strengths\": [..], \"weaknesses\": [..], \"suggestions\": [..] }}. \
         Consider brand alignment, audience fit, engagement potential and clarity.",
        name = research.brand_name,
        description = research.description,
        audience = research.target_audience,
        content = to_pretty_json(content),
    )
}

fn refine_prompt(
    content: &GeneratedContent,
    critique: &CritiqueResult,
    research: &BrandResearch,
) -> String {
    format!(
        "You are a senior copywriter. Refine this ad campaign based on the critique.\n\n\
         Original Content:\n{content}\n\n\
         Weaknesses: {weaknesses}\n\
         Suggestions: {suggestions}\n\n\
         Brand: {name}. {description} Audience: {audience}.\n\n\
         Return the refined content as a JSON object with exactly the same keys as the \
         original. Keep what works and improve what does not.",
        content = to_pretty_json(content),
        weaknesses = critique.weaknesses.join(", "),
        suggestions = critique.suggestions.join(", "),
        name = research.brand_name,
        description = research.description,
        audience = research.target_audience,
    )
}

// ---- stage impls ----

#[async_trait]
impl ContentGenerator for LlmClient {
    async fn generate(
        &self,
        research: &BrandResearch,
        platforms: &[Platform],
        tone: &str,
        goal: Goal,
    ) -> Result<GeneratedContent, StageError> {
        let prompt = generate_prompt(research, platforms, tone, goal);
        let content: GeneratedContent = self.complete_json(&prompt).await?;
        Ok(retain_platforms(content, platforms))
    }
}

#[async_trait]
impl Critic for LlmClient {
    async fn critique(
        &self,
        research: &BrandResearch,
        content: &GeneratedContent,
        tone: &str,
    ) -> Result<CritiqueResult, StageError> {
        self.complete_json(&critique_prompt(research, content, tone))
            .await
    }
}

#[async_trait]
impl Refiner for LlmClient {
    async fn refine(
        &self,
        content: &GeneratedContent,
        critique: &CritiqueResult,
        research: &BrandResearch,
    ) -> Result<GeneratedContent, StageError> {
        self.complete_json(&refine_prompt(content, critique, research))
            .await
    }
}
