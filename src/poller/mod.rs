// Relevance poller.
// Fetches strong-match listings, diffs their ids against what has already
// been seen, and notifies once per newly appeared listing.

pub mod scheduler;
pub mod service;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::JobSource;
use crate::error::AppError;
use crate::models::job::JobListing;
use crate::notify::{NotificationCenter, NotificationSpec};
use crate::toast::{Toast, ToastSink};

pub const TITLE_LIMIT: usize = 100;
pub const BODY_LIMIT: usize = 200;

const NOTIFICATION_TITLE: &str = "New Strong Match Job!";
const NOTIFICATION_TAG: &str = "new-job-notification";
const NOTIFICATION_TTL: Duration = Duration::from_secs(10);
const SUMMARY_DURATION: Duration = Duration::from_secs(10);
const TEST_TITLE: &str = "Test Job";
const TEST_BODY: &str = "This is a test notification to verify the system is working correctly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// First fetch after startup or a toggle: ids recorded, nothing notified.
    Baseline { seeded: usize },
    /// Regular pass; `new_ids` were notified, in fetch order.
    Checked { new_ids: Vec<String> },
    /// Notifications are off; only the listing snapshot was refreshed.
    Disabled { fetched: usize },
}

/// What readers see of the poller. Republished whenever tracking state
/// changes, so status pages never wait on an in-flight fetch.
#[derive(Debug, Clone, Default)]
pub struct PollerSnapshot {
    pub baseline_pending: bool,
    pub observed_count: usize,
    pub latest: Vec<JobListing>,
    pub last_refresh_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub type SharedSnapshot = Arc<Mutex<PollerSnapshot>>;

/// Sends the per-listing system notification and in-app toast.
#[derive(Clone)]
pub struct ListingAlerts {
    notifier: Arc<dyn NotificationCenter>,
    toasts: Arc<dyn ToastSink>,
    icon: Option<String>,
}

impl ListingAlerts {
    pub fn new(notifier: Arc<dyn NotificationCenter>, toasts: Arc<dyn ToastSink>) -> Self {
        Self {
            notifier,
            toasts,
            icon: None,
        }
    }

    /// Announce one listing. Returns whether a system notification was shown;
    /// the in-app toast is pushed regardless.
    pub fn notify_listing(&self, listing: &JobListing) -> bool {
        let title = truncate(listing.title_or_default(), TITLE_LIMIT);
        let body = truncate(listing.description_or_default(), BODY_LIMIT);

        let mut shown = false;
        if self.notifier.query_permission().is_granted() {
            let spec = NotificationSpec {
                title: NOTIFICATION_TITLE.to_string(),
                body: format!("Details: {title}\n\n{body}"),
                icon: self.icon.clone(),
                tag: NOTIFICATION_TAG.to_string(),
            };
            match self.notifier.show(&spec) {
                Ok(handle) => {
                    shown = true;
                    let clicked = title.clone();
                    handle.on_click(Box::new(move || {
                        tracing::info!("Notification clicked: {clicked}");
                    }));
                    tokio::spawn(async move {
                        tokio::time::sleep(NOTIFICATION_TTL).await;
                        handle.close();
                    });
                }
                Err(e) => {
                    tracing::error!("Error creating notification: {e}");
                    self.toasts.push(Toast::error(
                        "Notification Error",
                        format!("Failed to create system notification: {e}"),
                    ));
                }
            }
        } else {
            tracing::debug!("Notification permission not granted, toast only");
        }

        self.toasts.push(Toast::info(NOTIFICATION_TITLE, title));
        shown
    }

    /// Push a fixed sample listing through the regular notification path.
    pub fn send_test(&self) -> bool {
        let sample = JobListing {
            id: None,
            title: Some(TEST_TITLE.to_string()),
            description: Some(TEST_BODY.to_string()),
            url: None,
            amount: None,
            currency: None,
            published_date: None,
            relevance: None,
        };
        self.notify_listing(&sample)
    }
}

pub struct RelevancePoller {
    source: Arc<dyn JobSource>,
    alerts: ListingAlerts,
    enabled: bool,
    is_initial_load: bool,
    observed: HashSet<String>,
    latest: Vec<JobListing>,
    last_refresh_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    snapshot: SharedSnapshot,
}

impl RelevancePoller {
    pub fn new(
        source: Arc<dyn JobSource>,
        notifier: Arc<dyn NotificationCenter>,
        toasts: Arc<dyn ToastSink>,
        enabled: bool,
    ) -> Self {
        let poller = Self {
            source,
            alerts: ListingAlerts::new(notifier, toasts),
            enabled,
            is_initial_load: true,
            observed: HashSet::new(),
            latest: Vec::new(),
            last_refresh_at: None,
            last_error: None,
            snapshot: SharedSnapshot::default(),
        };
        poller.publish();
        poller
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.alerts.icon = Some(icon.into());
        self
    }

    pub fn alerts(&self) -> &ListingAlerts {
        &self.alerts
    }

    pub fn snapshot(&self) -> SharedSnapshot {
        self.snapshot.clone()
    }

    /// Switch notifications on or off. Either way the next successful fetch
    /// becomes a fresh baseline.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.reset_tracking();
    }

    pub fn reset_tracking(&mut self) {
        self.is_initial_load = true;
        self.observed.clear();
        self.publish();
    }

    #[cfg(test)]
    pub fn observed(&self) -> &HashSet<String> {
        &self.observed
    }

    #[cfg(test)]
    pub fn is_initial_load(&self) -> bool {
        self.is_initial_load
    }

    #[cfg(test)]
    pub fn latest(&self) -> &[JobListing] {
        &self.latest
    }

    #[cfg(test)]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// One fetch-compare-notify pass.
    ///
    /// A failed fetch leaves the observed set and baseline flag untouched and
    /// is reported through one error toast before being returned.
    pub async fn run_cycle(&mut self, trigger: CycleTrigger) -> Result<CycleOutcome, AppError> {
        let listings = match self.source.fetch_strong_matches().await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::warn!("Strong-match fetch failed: {e}");
                self.last_error = Some(e.to_string());
                self.alerts.toasts.push(Toast::error(
                    "API Unavailable",
                    format!("Could not load strong-match jobs: {e}"),
                ));
                self.publish();
                return Err(e);
            }
        };

        self.last_error = None;
        self.last_refresh_at = Some(Utc::now());

        let outcome = if !self.enabled {
            CycleOutcome::Disabled {
                fetched: listings.len(),
            }
        } else {
            self.track(&listings)
        };

        self.update_latest(listings, trigger);
        self.publish();
        Ok(outcome)
    }

    fn track(&mut self, listings: &[JobListing]) -> CycleOutcome {
        let current: HashSet<&str> = listings.iter().filter_map(|l| l.id.as_deref()).collect();

        if self.is_initial_load {
            self.observed = current.iter().map(|id| id.to_string()).collect();
            self.is_initial_load = false;
            tracing::info!(
                "Baseline recorded with {} strong-match jobs, no notifications sent",
                self.observed.len()
            );
            return CycleOutcome::Baseline {
                seeded: self.observed.len(),
            };
        }

        // Walk the fetch order rather than the set so notifications keep the
        // backend's ordering; the seen set guards against duplicate ids.
        let mut new_ids = Vec::new();
        let mut seen = HashSet::new();
        let mut new_listings = Vec::new();
        for listing in listings {
            let Some(id) = listing.id.as_deref() else {
                continue;
            };
            if !self.observed.contains(id) && seen.insert(id) {
                new_ids.push(id.to_string());
                new_listings.push(listing);
            }
        }

        if !new_listings.is_empty() {
            tracing::info!("Found {} new strong-match jobs", new_listings.len());
            for listing in &new_listings {
                self.alerts.notify_listing(listing);
            }

            let count = new_listings.len();
            let plural = if count == 1 { "" } else { "s" };
            self.alerts.toasts.push(
                Toast::info(
                    format!("{count} New Strong Match Job{plural} Found!"),
                    "System notifications have been sent for each new job.",
                )
                .with_duration(SUMMARY_DURATION),
            );
        }

        // Ids that disappeared stay observed, so a listing that drops out and
        // comes back is not announced twice.
        self.observed.extend(new_ids.iter().cloned());
        CycleOutcome::Checked { new_ids }
    }

    /// Manual refreshes replace the listing list; scheduled polls put listings
    /// not already shown in front of the existing ones.
    fn update_latest(&mut self, listings: Vec<JobListing>, trigger: CycleTrigger) {
        match trigger {
            CycleTrigger::Manual => self.latest = listings,
            CycleTrigger::Scheduled if self.latest.is_empty() => self.latest = listings,
            CycleTrigger::Scheduled => {
                let shown: HashSet<String> =
                    self.latest.iter().filter_map(|l| l.id.clone()).collect();
                let mut merged: Vec<JobListing> = listings
                    .into_iter()
                    .filter(|l| l.id.as_ref().is_some_and(|id| !shown.contains(id)))
                    .collect();
                merged.append(&mut self.latest);
                self.latest = merged;
            }
        }
    }

    fn publish(&self) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        *snapshot = PollerSnapshot {
            baseline_pending: self.is_initial_load,
            observed_count: self.observed.len(),
            latest: self.latest.clone(),
            last_refresh_at: self.last_refresh_at,
            last_error: self.last_error.clone(),
        };
    }
}

/// Cut `text` to `max` characters, appending "..." when anything was cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::backend::JobSource;
    use crate::error::AppError;
    use crate::models::job::JobListing;

    pub fn listing(id: &str) -> JobListing {
        JobListing {
            id: Some(id.to_string()),
            title: Some(format!("Job {id}")),
            description: Some(format!("Description of {id}")),
            url: None,
            amount: None,
            currency: None,
            published_date: None,
            relevance: None,
        }
    }

    pub fn listings(ids: &[&str]) -> Vec<JobListing> {
        ids.iter().map(|id| listing(id)).collect()
    }

    /// Replays queued responses; once the script runs out the last successful
    /// response is repeated.
    #[derive(Default)]
    pub struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<JobListing>, String>>>,
        last: Mutex<Vec<JobListing>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_ok(&self, listings: Vec<JobListing>) {
            self.script.lock().unwrap().push_back(Ok(listings));
        }

        pub fn push_err(&self, message: &str) {
            self.script.lock().unwrap().push_back(Err(message.to_string()));
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobSource for ScriptedSource {
        async fn fetch_strong_matches(&self) -> Result<Vec<JobListing>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(listings)) => {
                    *self.last.lock().unwrap() = listings.clone();
                    Ok(listings)
                }
                Some(Err(message)) => Err(AppError::Backend {
                    status: 503,
                    detail: message,
                }),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }
}
