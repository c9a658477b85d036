use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::StorageConfig;
use crate::services::reconcile::{OrphanSweeper, SweepStats};

pub struct Scheduler {
    sweeper: OrphanSweeper,
    config: StorageConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(sweeper: OrphanSweeper, config: StorageConfig) -> Self {
        Self {
            sweeper,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Runs the cron loop until [`Scheduler::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.sweep_enabled {
            info!("Orphan sweep is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let sweeper = self.sweeper.clone();
        let running = Arc::clone(&self.running);
        let job = Job::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let sweeper = sweeper.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let start = std::time::Instant::now();
                info!(event = "job_started", job_name = "sweep_orphans", "Starting scheduled orphan sweep");

                match sweeper.sweep().await {
                    Ok(stats) => info!(
                        event = "job_finished",
                        job_name = "sweep_orphans",
                        scanned = stats.scanned,
                        deleted = stats.deleted,
                        errors = stats.errors,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Scheduled orphan sweep finished"
                    ),
                    Err(e) => {
                        error!(event = "job_failed", job_name = "sweep_orphans", error = %e, "Scheduled orphan sweep failed");
                    }
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Orphan sweep scheduled: {}", self.config.sweep_cron);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<SweepStats> {
        info!("Running manual orphan sweep...");
        self.sweeper.sweep().await
    }
}
