//! Cron wiring for the collection flows.
//!
//! The live flow runs on `collection.live_cron`; the historical flow runs
//! once at startup. A trigger that fires while the previous run of the same
//! flow is still executing is skipped.

use std::sync::Arc;

use anyhow::{Context, Result};
use basis_collector::{CollectionOrchestrator, Flow};
use basis_core::CollectionConfig;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct CollectionScheduler {
    orchestrator: Arc<CollectionOrchestrator>,
    config: CollectionConfig,
    cancel: CancellationToken,
    live_running: Arc<Mutex<()>>,
    historical_running: Arc<Mutex<()>>,
}

impl CollectionScheduler {
    #[must_use]
    pub fn new(
        orchestrator: Arc<CollectionOrchestrator>,
        config: CollectionConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            config,
            cancel,
            live_running: Arc::new(Mutex::new(())),
            historical_running: Arc::new(Mutex::new(())),
        }
    }

    /// Registers the live job, spawns the startup backfill and starts the
    /// scheduler. The caller owns shutdown.
    ///
    /// # Errors
    /// Returns an error if the cron expression is invalid or the scheduler
    /// fails to start.
    pub async fn start(&self) -> Result<JobScheduler> {
        info!(cron = %self.config.live_cron, "Starting collection scheduler");

        let scheduler = JobScheduler::new().await?;

        let orchestrator = self.orchestrator.clone();
        let running = self.live_running.clone();
        let cancel = self.cancel.clone();
        let job = Job::new_async(self.config.live_cron.as_str(), move |_uuid, _lock| {
            let orchestrator = orchestrator.clone();
            let running = running.clone();
            let cancel = cancel.clone();
            Box::pin(async move {
                run_flow(Flow::Live, orchestrator, running, cancel).await;
            })
        })
        .with_context(|| format!("Invalid live_cron '{}'", self.config.live_cron))?;

        scheduler.add(job).await?;

        if self.config.run_backfill_on_startup {
            tokio::spawn(run_flow(
                Flow::Historical,
                self.orchestrator.clone(),
                self.historical_running.clone(),
                self.cancel.clone(),
            ));
        } else {
            info!("Startup backfill disabled");
        }

        scheduler.start().await?;
        info!("Collection scheduler started");
        Ok(scheduler)
    }
}

/// Runs one flow unless a previous run of it still holds `running`.
///
/// Returns false if the trigger was skipped.
async fn run_flow(
    flow: Flow,
    orchestrator: Arc<CollectionOrchestrator>,
    running: Arc<Mutex<()>>,
    cancel: CancellationToken,
) -> bool {
    let Ok(_guard) = running.try_lock_owned() else {
        warn!(flow = %flow, "Previous run still executing, skipping trigger");
        return false;
    };
    if cancel.is_cancelled() {
        return false;
    }

    let result = match flow {
        Flow::Live => orchestrator.run_live(&cancel).await,
        Flow::Historical => orchestrator.run_historical(&cancel).await,
    };
    if let Err(e) = result {
        error!(flow = %flow, error = %format!("{e:#}"), "Flow failed");
    }
    true
}
