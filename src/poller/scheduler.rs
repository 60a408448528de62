use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::poller::{CycleTrigger, RelevancePoller};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(90);

pub type SharedPoller = Arc<tokio::sync::Mutex<RelevancePoller>>;

/// Background task driving the poller on a fixed interval.
///
/// The first cycle runs as soon as the task starts. A tick that finds the
/// poller busy (a manual refresh still in flight) is skipped. Dropping the
/// handle aborts the task, so no fetch can fire after teardown.
pub struct PollTask {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    next_poll_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl PollTask {
    pub fn start(poller: SharedPoller, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let next_poll_at = Arc::new(Mutex::new(None));
        let handle = tokio::spawn(run(poller, interval, shutdown_rx, next_poll_at.clone()));

        tracing::info!("Polling for strong-match jobs every {}s", interval.as_secs());
        Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            next_poll_at,
        }
    }

    pub fn next_poll_at(&self) -> Option<DateTime<Utc>> {
        *self.next_poll_at.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Signal the loop to exit and wait for it. A cycle in flight is cancelled
    /// at its fetch, before it touches any tracking state.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        tracing::info!("Polling stopped");
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run(
    poller: SharedPoller,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
    next_poll_at: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let next = chrono::Duration::from_std(interval)
            .ok()
            .map(|step| Utc::now() + step);
        *next_poll_at.lock().unwrap_or_else(|e| e.into_inner()) = next;

        let Ok(mut guard) = poller.try_lock() else {
            tracing::debug!("Previous cycle still running, skipping tick");
            continue;
        };

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = guard.run_cycle(CycleTrigger::Scheduled) => {
                if let Err(e) = result {
                    // Already surfaced as a toast; the next tick retries.
                    tracing::debug!("Scheduled cycle failed: {e}");
                }
            }
        }
    }
}
