use std::sync::Arc;

use async_trait::async_trait;
use flightwatch_core::repository::WatchStore;
use flightwatch_core::{CoreError, CoreResult};
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::runner::WatchRunner;
use crate::scheduler::Job;

/// Outcome counts for one pass over the enabled watches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub attempted: usize,
    pub captured: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Runs every enabled watch, one after another. A failing watch is logged and
/// the sweep moves on. Each run gets its own task so a panic stays with its watch.
pub struct WatchSweep {
    watches: Arc<dyn WatchStore>,
    runner: Arc<WatchRunner>,
}

impl WatchSweep {
    pub fn new(watches: Arc<dyn WatchStore>, runner: Arc<WatchRunner>) -> Self {
        Self { watches, runner }
    }

    /// Fails only when the enabled watches cannot be listed.
    pub async fn run_once(&self) -> CoreResult<SweepReport> {
        let watches = self.watches.list_enabled().await?;
        let mut report = SweepReport::default();

        for watch in watches {
            report.attempted += 1;
            let runner = self.runner.clone();
            let watch_id = watch.id;
            let run = tokio::spawn(async move { runner.run(watch_id).await }.in_current_span());

            match run.await {
                Ok(Ok(Some(_))) => report.captured += 1,
                Ok(Ok(None)) => report.empty += 1,
                // Disabled or deleted between listing and running.
                Ok(Err(e @ (CoreError::WatchDisabled(_) | CoreError::WatchNotFound(_)))) => {
                    warn!("Skipping watch {}: {}", watch.id, e);
                    report.empty += 1;
                }
                Ok(Err(e)) => {
                    error!("Watch {} ({}->{}) failed: {}", watch.id, watch.origin, watch.destination, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Watch {} ({}->{}) aborted: {}", watch.id, watch.origin, watch.destination, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl Job for WatchSweep {
    fn name(&self) -> &str {
        "watch-sweep"
    }

    async fn run(&self) {
        let tick_id = Uuid::new_v4();
        let span = info_span!("watch_sweep", %tick_id);

        async {
            info!("Sweep started");
            match self.run_once().await {
                Ok(report) => info!(
                    attempted = report.attempted,
                    captured = report.captured,
                    empty = report.empty,
                    failed = report.failed,
                    "Sweep finished"
                ),
                Err(e) => error!("Sweep aborted, could not list watches: {}", e),
            }
        }
        .instrument(span)
        .await
    }
}
