use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info, warn};

/// Unit of periodic work.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self);
}

/// When a scheduled job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fixed delay between triggers, starting one period after scheduling.
    Every(Duration),
    /// Wall-clock boundaries in UTC (e.g. every hour on the hour). The period
    /// must divide a day into whole seconds, minutes or hours.
    Aligned(Duration),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("period {0:?} has no wall-clock alignment")]
    UnalignedPeriod(Duration),

    #[error("cron scheduler: {0}")]
    Cron(String),
}

fn cron_error(e: tokio_cron_scheduler::JobSchedulerError) -> ScheduleError {
    ScheduleError::Cron(format!("{:?}", e))
}

/// Six-field cron expression (seconds first) firing on UTC multiples of `period`.
pub fn cron_expression(period: Duration) -> Option<String> {
    if period.subsec_nanos() != 0 {
        return None;
    }
    match period.as_secs() {
        s @ 1..=59 if 60 % s == 0 => Some(format!("*/{} * * * * *", s)),
        s if s % 60 == 0 && s < 3600 && 3600 % s == 0 => Some(format!("0 */{} * * * *", s / 60)),
        s if s % 3600 == 0 && s < 86_400 && 86_400 % s == 0 => {
            Some(format!("0 0 */{} * * *", s / 3600))
        }
        86_400 => Some("0 0 0 * * *".to_string()),
        _ => None,
    }
}

#[async_trait]
pub trait Scheduler: Send {
    async fn schedule(&mut self, cadence: Cadence, job: Arc<dyn Job>) -> Result<(), ScheduleError>;

    /// Stops future triggers and waits for any in-flight run to finish.
    async fn shutdown(&mut self);
}

/// Starts `job` unless its previous run still holds `in_flight`.
fn trigger(job: &Arc<dyn Job>, in_flight: &Arc<Mutex<()>>) {
    let Ok(guard) = in_flight.clone().try_lock_owned() else {
        warn!("Job '{}' still running, skipping this trigger", job.name());
        return;
    };

    let job = job.clone();
    tokio::spawn(async move {
        let _guard = guard;
        let name = job.name().to_string();
        if let Err(e) = tokio::spawn(async move { job.run().await }).await {
            error!("Job '{}' ended abnormally: {}", name, e);
        }
    });
}

/// Tokio-backed scheduler. `Every` jobs get their own trigger task, `Aligned`
/// jobs go on a shared cron scheduler. A trigger that fires while the previous
/// run of the same job is still going is skipped.
pub struct TokioScheduler {
    stop_tx: watch::Sender<bool>,
    triggers: Vec<JoinHandle<()>>,
    cron: Option<JobScheduler>,
    in_flight: Vec<Arc<Mutex<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            triggers: Vec::new(),
            cron: None,
            in_flight: Vec::new(),
        }
    }

    fn schedule_every(&mut self, period: Duration, job: Arc<dyn Job>, in_flight: Arc<Mutex<()>>) {
        let mut stop_rx = self.stop_tx.subscribe();

        let trigger_task = tokio::spawn(async move {
            loop {
                if *stop_rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = stop_rx.changed() => break,
                }
                trigger(&job, &in_flight);
            }
            info!("Job '{}' stopped", job.name());
        });

        self.triggers.push(trigger_task);
    }

    async fn schedule_aligned(
        &mut self,
        period: Duration,
        job: Arc<dyn Job>,
        in_flight: Arc<Mutex<()>>,
    ) -> Result<(), ScheduleError> {
        let expr = cron_expression(period).ok_or(ScheduleError::UnalignedPeriod(period))?;

        let cron = match &self.cron {
            Some(cron) => cron.clone(),
            None => {
                let cron = JobScheduler::new().await.map_err(cron_error)?;
                cron.start().await.map_err(cron_error)?;
                self.cron = Some(cron.clone());
                cron
            }
        };

        let cron_job = CronJob::new_async(expr.as_str(), move |_id, _sched| {
            let job = job.clone();
            let in_flight = in_flight.clone();
            Box::pin(async move { trigger(&job, &in_flight) })
        })
        .map_err(cron_error)?;
        cron.add(cron_job).await.map_err(cron_error)?;
        Ok(())
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn schedule(&mut self, cadence: Cadence, job: Arc<dyn Job>) -> Result<(), ScheduleError> {
        let in_flight = Arc::new(Mutex::new(()));
        let name = job.name().to_string();
        match cadence {
            Cadence::Every(period) => self.schedule_every(period, job, in_flight.clone()),
            Cadence::Aligned(period) => self.schedule_aligned(period, job, in_flight.clone()).await?,
        }
        self.in_flight.push(in_flight);
        info!("Scheduled job '{}' ({:?})", name, cadence);
        Ok(())
    }

    async fn shutdown(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(mut cron) = self.cron.take() {
            if let Err(e) = cron.shutdown().await {
                warn!("Cron scheduler did not shut down cleanly: {:?}", e);
            }
        }
        for trigger_task in self.triggers.drain(..) {
            let _ = trigger_task.await;
        }
        // Each run holds its job's lock until it returns.
        for in_flight in self.in_flight.drain(..) {
            let _ = in_flight.lock().await;
        }
    }
}
