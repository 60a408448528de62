use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::job::JobListing;
use crate::notify::{NotificationCenter, Permission};
use crate::poller::scheduler::{PollTask, SharedPoller};
use crate::poller::{CycleOutcome, CycleTrigger, ListingAlerts, RelevancePoller, SharedSnapshot};
use crate::settings::NotificationSettings;
use crate::toast::{Toast, ToastSink};

#[derive(Debug, Clone, Serialize)]
pub struct PollerStatus {
    pub enabled: bool,
    pub permission: Permission,
    pub baseline_pending: bool,
    pub observed_count: usize,
    pub latest_count: usize,
    pub poll_interval_secs: u64,
    pub last_refresh_at: Option<DateTime<Utc>>,
    pub next_poll_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestNotification {
    /// Whether a system notification was shown; the toast is always sent.
    pub delivered: bool,
    pub permission: Permission,
}

/// Owns the poller, its schedule, and the persisted on/off switch.
///
/// Reads go through the published snapshot and never take the poller lock,
/// which a running cycle holds for the length of its fetch.
pub struct PollerService {
    poller: SharedPoller,
    snapshot: SharedSnapshot,
    alerts: ListingAlerts,
    enabled: AtomicBool,
    notifier: Arc<dyn NotificationCenter>,
    toasts: Arc<dyn ToastSink>,
    settings: Mutex<NotificationSettings>,
    task: Mutex<Option<PollTask>>,
    interval: Duration,
}

impl PollerService {
    pub fn new(
        poller: RelevancePoller,
        notifier: Arc<dyn NotificationCenter>,
        toasts: Arc<dyn ToastSink>,
        settings: NotificationSettings,
        interval: Duration,
    ) -> Self {
        Self {
            snapshot: poller.snapshot(),
            alerts: poller.alerts().clone(),
            enabled: AtomicBool::new(settings.enabled()),
            poller: Arc::new(Mutex::new(poller)),
            notifier,
            toasts,
            settings: Mutex::new(settings),
            task: Mutex::new(None),
            interval,
        }
    }

    /// Bring the poller up in the persisted state. When enabled the schedule
    /// starts (and fetches right away); otherwise a single fetch fills the
    /// listing snapshot.
    pub async fn start(&self) {
        let enabled = self.settings.lock().await.enabled();
        self.poller.lock().await.set_enabled(enabled);

        if enabled {
            if !self.notifier.query_permission().is_granted() {
                let permission = self.notifier.request_permission().await;
                if !permission.is_granted() {
                    tracing::warn!("Notification permission not granted, falling back to toasts");
                }
            }
            *self.task.lock().await = Some(PollTask::start(self.poller.clone(), self.interval));
        } else {
            let mut poller = self.poller.lock().await;
            if let Err(e) = poller.run_cycle(CycleTrigger::Manual).await {
                tracing::warn!("Initial fetch failed: {e}");
            }
        }
    }

    /// Switch notifications on or off.
    ///
    /// Enabling needs notification permission; when it is refused nothing is
    /// persisted and `PermissionDenied` is returned.
    pub async fn set_enabled(&self, enabled: bool) -> Result<PollerStatus, AppError> {
        let mut settings = self.settings.lock().await;
        if settings.enabled() == enabled {
            drop(settings);
            return Ok(self.status().await);
        }

        if enabled {
            let mut permission = self.notifier.query_permission();
            if !permission.is_granted() {
                permission = self.notifier.request_permission().await;
            }
            if !permission.is_granted() {
                self.toasts.push(Toast::error(
                    "Notification Permission Denied",
                    "Please allow notifications on this host to receive job alerts.",
                ));
                return Err(AppError::PermissionDenied);
            }
        }

        settings.set_enabled(enabled).await?;
        self.enabled.store(enabled, Ordering::SeqCst);

        if let Some(task) = self.task.lock().await.take() {
            task.stop().await;
        }
        self.poller.lock().await.set_enabled(enabled);

        if enabled {
            *self.task.lock().await = Some(PollTask::start(self.poller.clone(), self.interval));
            self.toasts.push(Toast::info(
                "Notifications Enabled",
                "You will now receive system notifications for new strong match jobs.",
            ));
        } else {
            self.toasts.push(Toast::info(
                "Notifications Disabled",
                "You will no longer receive notifications for new strong match jobs.",
            ));
        }
        tracing::info!("Notifications {}", if enabled { "enabled" } else { "disabled" });

        drop(settings);
        Ok(self.status().await)
    }

    /// Run a cycle now, outside the schedule. Refused while another cycle is
    /// still in flight.
    pub async fn refresh(&self) -> Result<CycleOutcome, AppError> {
        let mut poller = self
            .poller
            .try_lock()
            .map_err(|_| AppError::Conflict("A refresh is already in progress".to_string()))?;
        poller.run_cycle(CycleTrigger::Manual).await
    }

    /// Run the per-listing notification path with a sample listing. Tracking
    /// state is not touched.
    pub fn send_test_notification(&self) -> TestNotification {
        let delivered = self.alerts.send_test();
        tracing::info!("Test notification sent (system notification shown: {delivered})");
        TestNotification {
            delivered,
            permission: self.notifier.query_permission(),
        }
    }

    pub fn latest(&self) -> Vec<JobListing> {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .latest
            .clone()
    }

    pub async fn status(&self) -> PollerStatus {
        let next_poll_at = self
            .task
            .lock()
            .await
            .as_ref()
            .and_then(PollTask::next_poll_at);
        let snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());

        PollerStatus {
            enabled: self.enabled.load(Ordering::SeqCst),
            permission: self.notifier.query_permission(),
            baseline_pending: snapshot.baseline_pending,
            observed_count: snapshot.observed_count,
            latest_count: snapshot.latest.len(),
            poll_interval_secs: self.interval.as_secs(),
            last_refresh_at: snapshot.last_refresh_at,
            next_poll_at,
            last_error: snapshot.last_error.clone(),
        }
    }

    pub async fn settings_ready(&self) -> Result<(), AppError> {
        let store = self.settings.lock().await.store().clone();
        store.ping().await
    }

    /// Stop the schedule. Called on shutdown.
    pub async fn shutdown(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.stop().await;
        }
    }
}
