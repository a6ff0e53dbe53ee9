//! Background smart playlist refresh
//!
//! Periodically regenerates every auto-refresh smart playlist whose interval
//! has elapsed. Runs independently of playback.

use cadence_playlists::Materializer;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct RefreshScheduler {
    materializer: Arc<Materializer>,
    check_interval: Duration,
}

/// Stops a running scheduler
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop and wait for the in-flight pass to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Refresh scheduler task failed");
        }
    }
}

impl RefreshScheduler {
    pub fn new(materializer: Arc<Materializer>, check_interval: Duration) -> Self {
        Self {
            materializer,
            check_interval,
        }
    }

    /// Start checking on the current runtime; the first check runs immediately
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.check_interval.as_secs(),
            "Smart playlist scheduler started"
        );

        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => self.check().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Smart playlist scheduler stopped");
    }

    /// One pass over the due playlists
    pub async fn check(&self) {
        match self.materializer.refresh_due(Utc::now()).await {
            Ok(reports) => {
                let failed = reports.iter().filter(|r| !r.is_ok()).count();
                if reports.is_empty() {
                    debug!("No smart playlists due");
                } else {
                    info!(
                        refreshed = reports.len() - failed,
                        failed, "Smart playlist refresh pass complete"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Failed to list smart playlists for refresh"),
        }
    }
}
