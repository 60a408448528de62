use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::settings::SettingsStore;

/// Non-persistent store for tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<bool>, AppError> {
        let values = self.values.lock().unwrap();
        Ok(values.get(key).copied())
    }

    async fn set(&self, key: &str, value: bool) -> Result<(), AppError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
