use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use adflow_db::{CampaignStore, InMemoryCampaignStore, PgCampaignStore};
use adflow_pipeline::{
    clients, CampaignDispatcher, CampaignOrchestrator, ClientsConfig, PipelineConfig,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adflow_api::background::stale_campaigns;
use adflow_api::config::ServerConfig;
use adflow_api::router::build_app_router;
use adflow_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "adflow_api=debug,adflow_pipeline=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();
    let clients_config = ClientsConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    tracing::info!(
        llm_configured = clients_config.llm_api_key.is_some(),
        images_configured = clients_config.image_api_key.is_some(),
        stage_timeout_secs = pipeline_config.stage_timeout.as_secs(),
        "Loaded pipeline configuration"
    );

    // --- Store ---
    let store = select_store().await;
    tracing::info!(backend = store.backend().as_str(), "Campaign store ready");

    // --- Pipeline ---
    let collaborators =
        clients::build_collaborators(&clients_config).expect("Failed to build HTTP clients");
    let orchestrator = Arc::new(CampaignOrchestrator::new(
        Arc::clone(&store),
        collaborators,
        pipeline_config,
    ));
    let dispatcher = Arc::new(CampaignDispatcher::new(orchestrator));

    // --- Stale campaign sweeper ---
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(stale_campaigns::run(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
        chrono::Duration::minutes(config.stale_campaign_minutes),
        Duration::from_secs(config.stale_check_interval_secs),
        sweeper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        store,
        dispatcher: Arc::clone(&dispatcher),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Stale campaign sweeper stopped");

    let drained = dispatcher
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if !drained {
        tracing::warn!("Exiting with campaign runs still in flight");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Pick the campaign store backend.
///
/// PostgreSQL when `DATABASE_URL` is set and reachable, otherwise the
/// process-local in-memory store.
async fn select_store() -> Arc<dyn CampaignStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, campaigns will not survive a restart");
        return Arc::new(InMemoryCampaignStore::new());
    };

    let pool = match adflow_db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable, falling back to in-memory store");
            return Arc::new(InMemoryCampaignStore::new());
        }
    };
    if let Err(e) = adflow_db::health_check(&pool).await {
        tracing::warn!(error = %e, "Database health check failed, falling back to in-memory store");
        return Arc::new(InMemoryCampaignStore::new());
    }
    tracing::info!("Database health check passed");

    adflow_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgCampaignStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
