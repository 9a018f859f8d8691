//! Route definitions for the `/campaigns` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /                  -> list_campaigns
/// POST   /                  -> create_campaign
/// GET    /{id}              -> get_campaign
/// DELETE /{id}              -> delete_campaign
/// GET    /{id}/status       -> get_campaign_status
/// POST   /{id}/regenerate   -> regenerate_campaign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/{id}",
            get(campaigns::get_campaign).delete(campaigns::delete_campaign),
        )
        .route("/{id}/status", get(campaigns::get_campaign_status))
        .route("/{id}/regenerate", post(campaigns::regenerate_campaign))
}
