use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bridge::HostBridge;
use crate::types::FineTuneStatus;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq)]
pub enum FineTuneOutcome {
    Completed(FineTuneStatus),
    Failed(String),
    Cancelled,
}

/// Cancels the monitor it was created with. Dropping it cancels too.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        // Only fails when the monitor is already gone.
        let _ = self.0.send(true);
    }
}

/// Polls a training job until it completes, fails or is cancelled.
pub struct FineTuneMonitor<B> {
    bridge: Arc<B>,
    job_id: String,
    interval: Duration,
    cancel: watch::Receiver<bool>,
}

impl<B: HostBridge> FineTuneMonitor<B> {
    pub fn new(bridge: Arc<B>, job_id: impl Into<String>) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let monitor = Self {
            bridge,
            job_id: job_id.into(),
            interval: POLL_INTERVAL,
            cancel: rx,
        };
        (monitor, CancelHandle(tx))
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Run until the job reaches a terminal state. `on_progress` sees every
    /// `running` update. The first poll happens one interval after start.
    /// Failed polls are logged and retried on the next tick.
    pub async fn run(mut self, mut on_progress: impl FnMut(&FineTuneStatus)) -> FineTuneOutcome {
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(job_id = %self.job_id, "monitoring fine-tune job");

        loop {
            if *self.cancel.borrow() {
                info!(job_id = %self.job_id, "fine-tune monitor cancelled");
                return FineTuneOutcome::Cancelled;
            }
            tokio::select! {
                biased;
                changed = self.cancel.changed() => {
                    if changed.is_err() {
                        info!(job_id = %self.job_id, "cancel handle dropped");
                        return FineTuneOutcome::Cancelled;
                    }
                }
                _ = ticker.tick() => {
                    let status = match self.bridge.fine_tune_status(&self.job_id).await {
                        Ok(status) => status,
                        Err(err) => {
                            warn!(job_id = %self.job_id, %err, "fine-tune status poll failed");
                            continue;
                        }
                    };
                    if status.is_complete() {
                        info!(job_id = %self.job_id, output = ?status.output_path, "fine-tune complete");
                        return FineTuneOutcome::Completed(status);
                    }
                    if status.is_error() {
                        let message = status
                            .error
                            .filter(|e| !e.is_empty())
                            .unwrap_or_else(|| "Unknown error".to_string());
                        warn!(job_id = %self.job_id, %message, "fine-tune failed");
                        return FineTuneOutcome::Failed(message);
                    }
                    if status.is_running() {
                        debug!(job_id = %self.job_id, epoch = status.epoch, loss = ?status.loss, "fine-tune progress");
                        on_progress(&status);
                    }
                }
            }
        }
    }
}
