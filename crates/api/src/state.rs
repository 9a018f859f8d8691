use std::sync::Arc;

use adflow_db::CampaignStore;
use adflow_pipeline::CampaignDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Campaign status store, chosen once at startup.
    pub store: Arc<dyn CampaignStore>,
    /// Launches and tracks detached campaign runs.
    pub dispatcher: Arc<CampaignDispatcher>,
    pub config: Arc<ServerConfig>,
}
