//! Handlers for the `/campaigns` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. Callers only see
//! and act on campaigns they own.

use adflow_core::campaign::{
    normalize_platforms, normalize_tone, normalize_website_url, CampaignStatus, Goal, Platform,
};
use adflow_core::error::CoreError;
use adflow_core::types::{DbId, Timestamp};
use adflow_db::models::campaign::{Campaign, CreateCampaign};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /campaigns`.
///
/// Platform and goal labels are parsed by hand so an unknown value is a
/// `VALIDATION_ERROR` rather than a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub website_url: String,
    pub platforms: Vec<String>,
    pub tone: String,
    pub goal: String,
}

/// Body of `POST /campaigns/{id}/regenerate`. An empty body keeps the tone.
#[derive(Debug, Default, Deserialize)]
pub struct RegenerateRequest {
    pub tone: Option<String>,
}

/// Lightweight payload for status polling.
#[derive(Debug, Serialize)]
pub struct CampaignStatusResponse {
    pub id: DbId,
    pub status: CampaignStatus,
    pub is_processing: bool,
    pub error_message: Option<String>,
    pub updated_at: Timestamp,
}

impl From<&Campaign> for CampaignStatusResponse {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            status: campaign.status,
            is_processing: campaign.status.is_processing(),
            error_message: campaign.error_message.clone(),
            updated_at: campaign.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegenerateAccepted {
    pub id: DbId,
    pub tone: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a campaign by ID and verify the caller owns it.
///
/// Returns `NotFound` if the campaign does not exist and `Forbidden` if it
/// belongs to someone else. `action` is used in the error message (e.g.
/// "view", "delete").
async fn find_and_authorize(
    state: &AppState,
    campaign_id: DbId,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Campaign> {
    let campaign = state
        .store
        .get(campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::campaign_not_found(campaign_id)))?;

    if campaign.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's campaign"
        ))));
    }

    Ok(campaign)
}

/// Validate and normalize a create request into the store DTO.
pub fn validate_create(owner_id: DbId, input: CreateCampaignRequest) -> AppResult<CreateCampaign> {
    let website_url = normalize_website_url(&input.website_url)?;

    let platforms = input
        .platforms
        .iter()
        .map(|p| p.trim().parse::<Platform>())
        .collect::<Result<Vec<_>, _>>()?;
    let platforms = normalize_platforms(&platforms)?;

    let tone = normalize_tone(&input.tone)?;
    let goal: Goal = input.goal.trim().parse()?;

    Ok(CreateCampaign {
        owner_id,
        website_url,
        platforms,
        tone,
        goal,
    })
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns
///
/// Validate the request, store a `pending` campaign and start its run in
/// the background. Returns 201 with the created record; clients poll
/// `/campaigns/{id}/status` for progress.
pub async fn create_campaign(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateCampaignRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let input = validate_create(auth.user_id, input)?;

    let campaign = state.store.create(&input).await?;

    tracing::info!(
        campaign_id = campaign.id,
        user_id = auth.user_id,
        website_url = %campaign.website_url,
        platforms = ?campaign.platforms,
        goal = %campaign.goal,
        "Campaign created",
    );

    state.dispatcher.start_campaign(campaign.id).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns
///
/// List the caller's campaigns, newest first.
pub async fn list_campaigns(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let campaigns = state.store.list_by_owner(auth.user_id).await?;
    Ok(Json(DataResponse { data: campaigns }))
}

// ---------------------------------------------------------------------------
// Get / status
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns/{id}
pub async fn get_campaign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let campaign = find_and_authorize(&state, campaign_id, &auth, "view").await?;
    Ok(Json(DataResponse { data: campaign }))
}

/// GET /api/v1/campaigns/{id}/status
///
/// Polling endpoint: status and error only, without the result payloads.
pub async fn get_campaign_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let campaign = find_and_authorize(&state, campaign_id, &auth, "view").await?;
    Ok(Json(DataResponse {
        data: CampaignStatusResponse::from(&campaign),
    }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/campaigns/{id}
///
/// Returns 204. A campaign with an active run cannot be deleted (409).
pub async fn delete_campaign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state, campaign_id, &auth, "delete").await?;

    if state.dispatcher.is_running(campaign_id).await {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot delete a campaign while it is processing".into(),
        )));
    }

    if !state.store.delete(campaign_id).await? {
        return Err(AppError::Core(CoreError::campaign_not_found(campaign_id)));
    }

    tracing::info!(campaign_id, user_id = auth.user_id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Regenerate
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns/{id}/regenerate
///
/// Re-run generation and critique from the stored brand research,
/// optionally with a new tone. Returns 202; the run continues in the
/// background.
pub async fn regenerate_campaign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    payload: Option<Json<RegenerateRequest>>,
) -> AppResult<impl IntoResponse> {
    let campaign = find_and_authorize(&state, campaign_id, &auth, "regenerate").await?;

    let new_tone = payload
        .and_then(|Json(body)| body.tone)
        .map(|tone| normalize_tone(&tone))
        .transpose()?;

    state
        .dispatcher
        .regenerate_campaign(campaign_id, new_tone.clone())
        .await?;

    tracing::info!(
        campaign_id,
        user_id = auth.user_id,
        new_tone = ?new_tone,
        "Campaign regeneration started",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: RegenerateAccepted {
                id: campaign_id,
                tone: new_tone.unwrap_or(campaign.tone),
            },
        }),
    ))
}
