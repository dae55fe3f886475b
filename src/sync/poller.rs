//! Periodic background pull.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{PullOutcome, PullTrigger, SyncCoordinator};

/// Owner of the polling task.
///
/// Dropping the handle aborts the task; [`PollerHandle::shutdown`] lets an
/// in-flight pull finish first.
pub struct PollerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop scheduling pulls and wait for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!("Sync poller exited abnormally: {}", e);
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub(super) fn spawn(coordinator: Arc<SyncCoordinator>, interval: Duration) -> PollerHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut trigger = PullTrigger::Initial;

        tracing::info!("Sync poller started (every {:?})", interval);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    match coordinator.pull(trigger).await {
                        Ok(PullOutcome::Applied { records }) => {
                            tracing::info!("Background pull applied {} records", records);
                        }
                        Ok(outcome) => tracing::debug!("Background pull: {:?}", outcome),
                        Err(e) => tracing::warn!("Background pull failed: {}", e),
                    }
                    trigger = PullTrigger::Timer;
                }
            }
        }

        tracing::info!("Sync poller stopped");
    });

    PollerHandle {
        stop: Some(stop_tx),
        task: Some(task),
    }
}
