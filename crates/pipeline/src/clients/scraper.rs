//! Brand research by scraping the campaign's website.
//!
//! Extraction is deliberately shallow: a handful of regular expressions
//! over the raw HTML plus keyword heuristics for positioning, audience and
//! tone.

use std::sync::LazyLock;

use adflow_core::campaign::BrandResearch;
use async_trait::async_trait;
use regex::Regex;

use crate::clients::ensure_success;
use crate::error::StageError;
use crate::stages::Researcher;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; AdflowBot/1.0)";

const MAX_TAGLINE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_FEATURES: usize = 10;
const MAX_VALUE_PROPOSITIONS: usize = 5;
/// Only the leading part of the page text feeds the keyword heuristics.
const TEXT_SAMPLE_LEN: usize = 2000;

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
        .expect("valid regex")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-4])\b[^>]*>(.*?)</h[1-4]>").expect("valid regex"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li>").expect("valid regex"));
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// [`Researcher`] that fetches the page over HTTP.
pub struct WebResearcher {
    client: reqwest::Client,
}

impl WebResearcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for WebResearcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Researcher for WebResearcher {
    async fn research(&self, website_url: &str) -> Result<BrandResearch, StageError> {
        let response = self
            .client
            .get(website_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| StageError::failed(format!("Failed to scrape website: {e}")))?;
        let html = ensure_success(response).await?.text().await?;

        tracing::debug!(website_url, bytes = html.len(), "Fetched brand website");
        Ok(extract_research(&html, website_url))
    }
}

/// Build brand research from a page's HTML.
pub fn extract_research(html: &str, website_url: &str) -> BrandResearch {
    let html = NOISE_RE.replace_all(html, " ");
    let metas = meta_tags(&html);
    let meta = |key: &str| -> Option<String> {
        metas
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| clean(v))
            .filter(|v| !v.is_empty())
    };

    let title = TITLE_RE
        .captures(&html)
        .map(|c| clean(&c[1]))
        .unwrap_or_default();
    let headings: Vec<(u8, String)> = HEADING_RE
        .captures_iter(&html)
        .filter_map(|c| {
            let level = c[1].parse().ok()?;
            Some((level, clean(&c[2])))
        })
        .filter(|(_, text)| !text.is_empty())
        .collect();

    let brand_name = meta("og:site_name")
        .or_else(|| brand_from_title(&title))
        .unwrap_or_else(|| brand_from_url(website_url));

    let meta_description = meta("description");
    let tagline = meta_description
        .clone()
        .or_else(|| meta("og:description"))
        .or_else(|| heading(&headings, 2))
        .map(|t| truncate(&t, MAX_TAGLINE_LEN));

    let description = meta_description
        .or_else(|| {
            PARAGRAPH_RE
                .captures_iter(&html)
                .map(|c| clean(&c[1]))
                .find(|p| !p.is_empty())
        })
        .map(|d| truncate(&d, MAX_DESCRIPTION_LEN))
        .unwrap_or_else(|| "No description found".to_string());

    let mut features: Vec<String> = LIST_ITEM_RE
        .captures_iter(&html)
        .map(|c| clean(&c[1]))
        .filter(|t| (11..200).contains(&t.chars().count()))
        .collect();
    features.extend(
        headings
            .iter()
            .filter(|(level, text)| *level >= 3 && (6..100).contains(&text.chars().count()))
            .map(|(_, text)| text.clone()),
    );
    features.truncate(MAX_FEATURES);

    let value_propositions: Vec<String> = headings
        .iter()
        .filter(|(level, text)| {
            (2..=3).contains(level) && (11..150).contains(&text.chars().count())
        })
        .map(|(_, text)| text.clone())
        .take(MAX_VALUE_PROPOSITIONS)
        .collect();

    let sample = truncate(&clean(&html), TEXT_SAMPLE_LEN).to_lowercase();

    BrandResearch {
        brand_name: capitalize(&brand_name),
        tagline,
        description,
        features,
        positioning: infer_positioning(&sample).to_string(),
        target_audience: infer_audience(&sample).to_string(),
        tone_of_voice: infer_tone(&sample).to_string(),
        value_propositions,
    }
}

// ---- extraction helpers ----

/// `(name-or-property, content)` pairs from every `<meta>` tag.
fn meta_tags(html: &str) -> Vec<(String, String)> {
    META_RE
        .find_iter(html)
        .filter_map(|m| {
            let mut key = None;
            let mut content = None;
            for attr in ATTR_RE.captures_iter(m.as_str()) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|v| v.as_str().to_string())
                    .unwrap_or_default();
                match attr[1].to_ascii_lowercase().as_str() {
                    "name" | "property" => key = Some(value),
                    "content" => content = Some(value),
                    _ => {}
                }
            }
            Some((key?, content?))
        })
        .collect()
}

fn heading(headings: &[(u8, String)], level: u8) -> Option<String> {
    headings
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, text)| text.clone())
}

fn brand_from_title(title: &str) -> Option<String> {
    let name = title.split('|').next()?.split(" - ").next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn brand_from_url(website_url: &str) -> String {
    let host = website_url
        .split("://")
        .nth(1)
        .unwrap_or(website_url)
        .split(['/', ':', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('.').next().unwrap_or(host).to_string()
}

/// Strip tags, decode HTML entities and collapse whitespace.
fn clean(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = html_escape::decode_html_entities(&text);
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---- keyword heuristics ----

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn infer_tone(text: &str) -> &'static str {
    if contains_any(text, &["enterprise", "business", "professional"]) {
        "Professional and business-oriented"
    } else if contains_any(text, &["fun", "easy", "simple"]) {
        "Casual and friendly"
    } else if contains_any(text, &["innovative", "cutting-edge", "revolutionary"]) {
        "Bold and innovative"
    } else {
        "Balanced and informative"
    }
}

fn infer_positioning(text: &str) -> &'static str {
    if contains_any(text, &["leader", "best"]) {
        "Market leader positioning"
    } else if contains_any(text, &["affordable", "budget"]) {
        "Value-focused positioning"
    } else if contains_any(text, &["premium", "luxury"]) {
        "Premium positioning"
    } else if contains_any(text, &["fast", "quick"]) {
        "Speed and efficiency positioning"
    } else {
        "Quality and reliability positioning"
    }
}

fn infer_audience(text: &str) -> &'static str {
    if contains_any(text, &["small business", "startup"]) {
        "Small businesses and startups"
    } else if contains_any(text, &["business", "enterprise", "b2b"]) {
        "Business professionals and enterprises"
    } else if contains_any(text, &["developer", "technical"]) {
        "Developers and technical users"
    } else if contains_any(text, &["creative", "designer"]) {
        "Creatives and designers"
    } else {
        "General consumers and professionals"
    }
}
