//! Critique summary and quality scoring.
//!
//! The critic stage produces a [`CritiqueResult`]; the orchestrator turns
//! it into the persisted [`CritiqueSummary`] via [`summarize`], which adds
//! the bounded quality score and the standard follow-up suggestions.

use serde::{Deserialize, Serialize};

use crate::campaign::GeneratedContent;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Score every campaign starts from.
pub const BASE_SCORE: f64 = 7.0;
/// Lowest possible score.
pub const MIN_SCORE: f64 = 0.0;
/// Highest possible score.
pub const MAX_SCORE: f64 = 10.0;

/// Bonus per strength, capped at [`MAX_STRENGTH_BONUS`].
pub const STRENGTH_BONUS: f64 = 0.5;
pub const MAX_STRENGTH_BONUS: f64 = 2.0;

/// Penalty per weakness, capped at [`MAX_WEAKNESS_PENALTY`].
pub const WEAKNESS_PENALTY: f64 = 0.3;
pub const MAX_WEAKNESS_PENALTY: f64 = 2.0;

/// Bonus per platform section that meets its completeness threshold.
pub const COMPLETENESS_BONUS: f64 = 0.5;

/// Minimum Instagram post ideas for the section to count as complete.
pub const MIN_INSTAGRAM_POST_IDEAS: usize = 3;
/// Minimum LinkedIn post drafts for the section to count as complete.
pub const MIN_LINKEDIN_POST_DRAFTS: usize = 2;
/// Minimum Twitter ad lines for the section to count as complete.
pub const MIN_TWITTER_AD_LINES: usize = 5;

/// Suggestions appended to every final critique.
pub const STANDARD_SUGGESTIONS: [&str; 2] = [
    "Test multiple variations to optimize performance",
    "Monitor engagement metrics and iterate based on data",
];

/// Strength reported when the critic stage is unavailable.
pub const FALLBACK_STRENGTH: &str = "Content generated successfully";
/// Suggestion reported when the critic stage is unavailable.
pub const FALLBACK_SUGGESTION: &str = "Review the generated content against your brand guidelines";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw output of the critic stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl CritiqueResult {
    /// Degenerate critique used when the critic stage fails.
    pub fn fallback() -> Self {
        Self {
            strengths: vec![FALLBACK_STRENGTH.to_string()],
            weaknesses: Vec::new(),
            suggestions: vec![FALLBACK_SUGGESTION.to_string()],
        }
    }
}

/// Persisted critique with the final quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueSummary {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    /// Always within `[MIN_SCORE, MAX_SCORE]`, one decimal place.
    pub overall_score: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Count the platform sections that meet their completeness threshold.
pub fn completeness(content: &GeneratedContent) -> usize {
    let instagram = content
        .instagram
        .as_ref()
        .is_some_and(|c| c.post_ideas.len() >= MIN_INSTAGRAM_POST_IDEAS);
    let linkedin = content
        .linkedin
        .as_ref()
        .is_some_and(|c| c.post_drafts.len() >= MIN_LINKEDIN_POST_DRAFTS);
    let twitter = content
        .twitter
        .as_ref()
        .is_some_and(|c| c.ad_lines.len() >= MIN_TWITTER_AD_LINES);

    [instagram, linkedin, twitter].into_iter().filter(|x| *x).count()
}

/// Compute the quality score for a critique and the content it reviewed.
///
/// `BASE_SCORE + strength bonus - weakness penalty + completeness bonus`,
/// clamped to `[MIN_SCORE, MAX_SCORE]` and rounded to one decimal.
pub fn quality_score(critique: &CritiqueResult, content: &GeneratedContent) -> f64 {
    let strengths = (critique.strengths.len() as f64 * STRENGTH_BONUS).min(MAX_STRENGTH_BONUS);
    let weaknesses =
        (critique.weaknesses.len() as f64 * WEAKNESS_PENALTY).min(MAX_WEAKNESS_PENALTY);
    let complete = completeness(content) as f64 * COMPLETENESS_BONUS;

    let score = BASE_SCORE + strengths - weaknesses + complete;
    let rounded = (score * 10.0).round() / 10.0;
    rounded.clamp(MIN_SCORE, MAX_SCORE)
}

/// Build the persisted summary: critic output, score and standard suggestions.
pub fn summarize(critique: CritiqueResult, content: &GeneratedContent) -> CritiqueSummary {
    let overall_score = quality_score(&critique, content);
    let mut suggestions = critique.suggestions;
    suggestions.extend(STANDARD_SUGGESTIONS.iter().map(|s| s.to_string()));

    CritiqueSummary {
        strengths: critique.strengths,
        weaknesses: critique.weaknesses,
        suggestions,
        overall_score,
    }
}
