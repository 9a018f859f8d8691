//! Detached campaign dispatch.
//!
//! Every run executes on its own Tokio task, wrapped by a supervisor task
//! that awaits it. The supervisor turns a panic into a `failed` write and
//! releases the campaign's slot in the active-run registry on every exit
//! path. Both tasks are tracked so shutdown can drain in-flight runs.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use adflow_core::error::CoreError;
use adflow_core::types::DbId;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::orchestrator::CampaignOrchestrator;

/// Which orchestrator entry point a spawned run calls.
#[derive(Debug, Clone)]
enum RunKind {
    Full,
    Regenerate { new_tone: Option<String> },
}

/// Starts campaign runs without blocking the caller.
///
/// At most one run per campaign id is active in this process; the registry
/// is the only guard against concurrent writers for a campaign.
pub struct CampaignDispatcher {
    orchestrator: Arc<CampaignOrchestrator>,
    active: Arc<Mutex<HashSet<DbId>>>,
    tracker: TaskTracker,
}

impl CampaignDispatcher {
    pub fn new(orchestrator: Arc<CampaignOrchestrator>) -> Self {
        Self {
            orchestrator,
            active: Arc::new(Mutex::new(HashSet::new())),
            tracker: TaskTracker::new(),
        }
    }

    /// Start a full run for a freshly created campaign.
    ///
    /// A second call for an id that is already running is logged and
    /// ignored.
    pub async fn start_campaign(&self, id: DbId) {
        if !self.claim(id).await {
            tracing::info!(campaign_id = id, "Campaign run already active, not starting another");
            return;
        }
        self.spawn_supervised(id, RunKind::Full);
    }

    /// Check regeneration preconditions, then start a regeneration run.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the campaign does not exist.
    /// - [`CoreError::Conflict`] if a run is active or the campaign is
    ///   still processing.
    /// - [`CoreError::Precondition`] if research was never stored.
    pub async fn regenerate_campaign(
        &self,
        id: DbId,
        new_tone: Option<String>,
    ) -> Result<(), CoreError> {
        let campaign = self
            .orchestrator
            .store()
            .get(id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or_else(|| CoreError::campaign_not_found(id))?;

        if campaign.status.is_processing() {
            return Err(CoreError::Conflict(format!(
                "Campaign is still processing (status: {})",
                campaign.status
            )));
        }
        if campaign.brand_research.is_none() {
            return Err(CoreError::Precondition(
                "Campaign has no brand research to regenerate from".into(),
            ));
        }
        if !self.claim(id).await {
            return Err(CoreError::Conflict(
                "Campaign already has an active run".into(),
            ));
        }

        self.spawn_supervised(id, RunKind::Regenerate { new_tone });
        Ok(())
    }

    /// Whether a run for `id` is currently active in this process.
    pub async fn is_running(&self, id: DbId) -> bool {
        self.active.lock().await.contains(&id)
    }

    /// Number of active runs.
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Stop accepting new runs and wait up to `timeout` for in-flight ones.
    ///
    /// Returns `true` if every run finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let in_flight = self.active_count().await;
        tracing::info!(in_flight, "Waiting for campaign runs to finish");

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("All campaign runs finished");
                true
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    remaining = self.active_count().await,
                    "Shutdown timeout elapsed with campaign runs still active",
                );
                false
            }
        }
    }

    // ---- private helpers ----

    /// Reserve the registry slot for `id`. Returns `false` if taken.
    async fn claim(&self, id: DbId) -> bool {
        self.active.lock().await.insert(id)
    }

    fn spawn_supervised(&self, id: DbId, kind: RunKind) {
        let run = {
            let orchestrator = Arc::clone(&self.orchestrator);
            self.tracker.spawn(async move {
                match kind {
                    RunKind::Full => orchestrator.run(id).await,
                    RunKind::Regenerate { new_tone } => {
                        orchestrator.regenerate(id, new_tone).await
                    }
                }
            })
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let active = Arc::clone(&self.active);
        self.tracker.spawn(async move {
            if let Err(e) = run.await {
                if e.is_panic() {
                    let reason = panic_reason(e.into_panic());
                    tracing::error!(campaign_id = id, panic = %reason, "Campaign run panicked");
                    orchestrator
                        .mark_failed(id, &format!("Campaign processing panicked: {reason}"))
                        .await;
                } else {
                    tracing::warn!(campaign_id = id, "Campaign run was cancelled");
                }
            }
            active.lock().await.remove(&id);
        });
    }
}

/// Best-effort text of a panic payload.
fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
