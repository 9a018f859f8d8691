//! Periodic sweep of campaigns stuck in a non-terminal status.
//!
//! A run that dies with the process (or hangs past every stage timeout)
//! would otherwise leave its campaign `researching` forever. The sweeper
//! marks such campaigns `failed` once they have gone untouched for the
//! configured threshold. Campaigns with a live run in this process are
//! left alone.

use std::sync::Arc;
use std::time::Duration;

use adflow_db::models::campaign::CampaignUpdate;
use adflow_db::{CampaignStore, StoreError};
use adflow_pipeline::CampaignDispatcher;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Error message written to campaigns failed by the sweeper.
pub const STALE_CAMPAIGN_MESSAGE: &str = "Campaign processing timed out";

/// Fail every stale campaign once. Returns how many were failed.
pub async fn sweep_once(
    store: &dyn CampaignStore,
    dispatcher: &CampaignDispatcher,
    stale_after: chrono::Duration,
) -> Result<usize, StoreError> {
    let cutoff = Utc::now() - stale_after;
    let stale = store.list_stale(cutoff).await?;

    let mut failed = 0;
    for campaign in stale {
        if dispatcher.is_running(campaign.id).await {
            tracing::debug!(campaign_id = campaign.id, "Stale sweep: run still active, skipping");
            continue;
        }
        if store
            .update(campaign.id, &CampaignUpdate::failed(STALE_CAMPAIGN_MESSAGE))
            .await?
            .is_some()
        {
            tracing::warn!(
                campaign_id = campaign.id,
                status = %campaign.status,
                updated_at = %campaign.updated_at,
                "Stale campaign marked failed",
            );
            failed += 1;
        }
    }
    Ok(failed)
}

/// Run the staleness sweep loop until `cancel` is triggered.
pub async fn run(
    store: Arc<dyn CampaignStore>,
    dispatcher: Arc<CampaignDispatcher>,
    stale_after: chrono::Duration,
    check_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        stale_after_mins = stale_after.num_minutes(),
        interval_secs = check_interval.as_secs(),
        "Stale campaign sweeper started"
    );

    let mut interval = tokio::time::interval(check_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale campaign sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(store.as_ref(), &dispatcher, stale_after).await {
                    Ok(0) => tracing::debug!("Stale sweep: nothing to fail"),
                    Ok(failed) => tracing::info!(failed, "Stale sweep: failed stuck campaigns"),
                    Err(e) => tracing::error!(error = %e, "Stale sweep failed"),
                }
            }
        }
    }
}
