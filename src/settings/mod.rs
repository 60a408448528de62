// Persisted operator settings.
// Only the notification switch lives here today; the store is a small
// key/value seam so the backing storage can be a file or Postgres.

mod file;
#[cfg(test)]
mod memory;
mod postgres;

pub use file::FileSettingsStore;
#[cfg(test)]
pub use memory::MemorySettingsStore;
pub use postgres::PgSettingsStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;

pub const NOTIFICATIONS_ENABLED_KEY: &str = "notifications_enabled";

/// Key/value storage that survives restarts.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<bool>, AppError>;

    async fn set(&self, key: &str, value: bool) -> Result<(), AppError>;

    /// Cheap reachability check used by the readiness check.
    async fn ping(&self) -> Result<(), AppError>;
}

/// The notification preference, read once at startup and written through on
/// every change.
#[derive(Clone)]
pub struct NotificationSettings {
    store: Arc<dyn SettingsStore>,
    enabled: bool,
}

impl NotificationSettings {
    /// Load the persisted preference. A missing key reads as disabled.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self, AppError> {
        let enabled = store
            .get(NOTIFICATIONS_ENABLED_KEY)
            .await?
            .unwrap_or(false);
        Ok(Self { store, enabled })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Persist first, then update the in-memory value, so a failed write
    /// leaves both sides at the old value.
    pub async fn set_enabled(&mut self, enabled: bool) -> Result<(), AppError> {
        self.store.set(NOTIFICATIONS_ENABLED_KEY, enabled).await?;
        self.enabled = enabled;
        Ok(())
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }
}
