pub mod campaigns;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /campaigns                       list, create
/// /campaigns/{id}                  get, delete
/// /campaigns/{id}/status           poll status
/// /campaigns/{id}/regenerate       regenerate content (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/campaigns", campaigns::router())
}
