//! Campaign domain types and the campaign status state machine.
//!
//! The status labels (`pending`, `researching`, `generating-content`, ...)
//! are the wire contract that polling clients depend on. Anything in
//! [`CampaignStatus::is_processing`] means "keep polling"; anything else
//! is terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the free-form tone descriptor.
pub const MAX_TONE_LEN: usize = 100;

/// Maximum length of a submitted website URL.
pub const MAX_URL_LEN: usize = 2048;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Social platform a campaign produces content for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Linkedin,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::Linkedin, Platform::Twitter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown platform: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

/// What the campaign is optimising for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Awareness,
    Engagement,
    Clicks,
    Conversions,
}

impl Goal {
    pub const ALL: [Goal; 4] = [
        Goal::Awareness,
        Goal::Engagement,
        Goal::Clicks,
        Goal::Conversions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Awareness => "awareness",
            Self::Engagement => "engagement",
            Self::Clicks => "clicks",
            Self::Conversions => "conversions",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown goal: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

/// Status ID type matching SMALLINT in the `campaign_statuses` lookup table.
pub type StatusId = i16;

/// Campaign lifecycle status.
///
/// Discriminants match the seed order of the `campaign_statuses` table.
/// They are storage ids, not the pipeline order; see
/// [`CampaignStatus::FORWARD_ORDER`] for the order runs advance through.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CampaignStatus {
    Pending = 1,
    Researching = 2,
    GeneratingContent = 3,
    GeneratingImages = 4,
    Critiquing = 5,
    Completed = 6,
    Failed = 7,
}

impl CampaignStatus {
    /// Every status, in seed-id order.
    pub const ALL: [CampaignStatus; 7] = [
        CampaignStatus::Pending,
        CampaignStatus::Researching,
        CampaignStatus::GeneratingContent,
        CampaignStatus::GeneratingImages,
        CampaignStatus::Critiquing,
        CampaignStatus::Completed,
        CampaignStatus::Failed,
    ];

    /// Order in which a full run announces its stages.
    pub const FORWARD_ORDER: [CampaignStatus; 6] = [
        CampaignStatus::Pending,
        CampaignStatus::Researching,
        CampaignStatus::GeneratingContent,
        CampaignStatus::Critiquing,
        CampaignStatus::GeneratingImages,
        CampaignStatus::Completed,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Wire label, as polled by clients.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Researching => "researching",
            Self::GeneratingContent => "generating-content",
            Self::GeneratingImages => "generating-images",
            Self::Critiquing => "critiquing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `true` while a run is (or should be) working on the campaign.
    pub fn is_processing(self) -> bool {
        matches!(
            self,
            Self::Pending
                | Self::Researching
                | Self::GeneratingContent
                | Self::GeneratingImages
                | Self::Critiquing
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in [`Self::FORWARD_ORDER`]; `None` for `Failed`.
    fn rank(self) -> Option<usize> {
        Self::FORWARD_ORDER.iter().position(|s| *s == self)
    }

    /// Whether an automatic transition from `self` to `next` is legal.
    ///
    /// Non-terminal statuses may move strictly forward or jump to `Failed`.
    /// Terminal statuses never transition on their own.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        match (self.rank(), next.rank()) {
            (Some(current), Some(target)) => target > current,
            _ => false,
        }
    }

    /// Whether a regeneration run may re-enter the pipeline at `next`.
    ///
    /// Regeneration starts a new run from a terminal state, always at
    /// `GeneratingContent`.
    pub fn can_restart_at(self, next: CampaignStatus) -> bool {
        self.is_terminal() && next == Self::GeneratingContent
    }
}

impl From<CampaignStatus> for StatusId {
    fn from(value: CampaignStatus) -> Self {
        value as StatusId
    }
}

impl TryFrom<StatusId> for CampaignStatus {
    type Error = CoreError;

    fn try_from(value: StatusId) -> Result<Self, Self::Error> {
        Self::from_id(value)
            .ok_or_else(|| CoreError::Internal(format!("Unknown campaign status id: {value}")))
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown campaign status: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Result payloads
// ---------------------------------------------------------------------------

/// What the research stage learned about the brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandResearch {
    pub brand_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub positioning: String,
    pub target_audience: String,
    pub tone_of_voice: String,
    #[serde(default)]
    pub value_propositions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramPost {
    pub slogan: String,
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramContent {
    #[serde(default)]
    pub post_ideas: Vec<InstagramPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedinContent {
    #[serde(default)]
    pub email_templates: Vec<String>,
    #[serde(default)]
    pub post_drafts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwitterContent {
    #[serde(default)]
    pub ad_lines: Vec<String>,
}

/// Generated copy, one optional section per platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<InstagramContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<LinkedinContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<TwitterContent>,
}

impl GeneratedContent {
    /// First piece of headline copy for a platform, used for image prompts.
    pub fn headline_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Instagram => self
                .instagram
                .as_ref()
                .and_then(|c| c.post_ideas.first())
                .map(|p| p.slogan.as_str()),
            Platform::Linkedin => self
                .linkedin
                .as_ref()
                .and_then(|c| c.post_drafts.first())
                .map(String::as_str),
            Platform::Twitter => self
                .twitter
                .as_ref()
                .and_then(|c| c.ad_lines.first())
                .map(String::as_str),
        }
    }
}

/// One rendered ad image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub platform: Platform,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Normalize and validate a submitted website URL.
///
/// A missing scheme defaults to `https://`. Only `http` and `https` URLs
/// with a host are accepted.
pub fn normalize_website_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Website URL is required".into()));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(CoreError::Validation(format!(
            "Website URL must be at most {MAX_URL_LEN} characters"
        )));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|_| CoreError::Validation("Invalid website URL".into()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(CoreError::Validation("Invalid website URL".into())),
    }

    Ok(candidate)
}

/// Deduplicate platforms (keeping first-seen order) and require at least one.
pub fn normalize_platforms(platforms: &[Platform]) -> Result<Vec<Platform>, CoreError> {
    let mut unique = Vec::with_capacity(platforms.len());
    for p in platforms {
        if !unique.contains(p) {
            unique.push(*p);
        }
    }
    if unique.is_empty() {
        return Err(CoreError::Validation(
            "At least one platform must be selected".into(),
        ));
    }
    Ok(unique)
}

/// Trim and validate a tone descriptor.
pub fn normalize_tone(raw: &str) -> Result<String, CoreError> {
    let tone = raw.trim();
    if tone.is_empty() {
        return Err(CoreError::Validation("Tone is required".into()));
    }
    if tone.chars().count() > MAX_TONE_LEN {
        return Err(CoreError::Validation(format!(
            "Tone must be at most {MAX_TONE_LEN} characters"
        )));
    }
    Ok(tone.to_string())
}
