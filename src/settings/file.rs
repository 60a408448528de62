use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::settings::SettingsStore;

/// Settings kept in a small JSON object on disk.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated settings file behind.
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, bool>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<bool>, AppError> {
        Ok(self.read_all().await?.get(key).copied())
    }

    async fn set(&self, key: &str, value: bool) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&values)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Saved setting {key}={value} to {}", self.path.display());
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.read_all().await.map(|_| ())
    }
}
