use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

const FEED_CAPACITY: usize = 50;
const DEFAULT_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A short in-app message shown to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
    /// How long a client should keep the toast on screen, in milliseconds.
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::build(title.into(), description.into(), ToastVariant::Default)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::build(title.into(), description.into(), ToastVariant::Destructive)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }

    fn build(title: String, description: String, variant: ToastVariant) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            variant,
            duration_ms: DEFAULT_DURATION.as_millis() as u64,
            created_at: Utc::now(),
        }
    }
}

/// Non-blocking message surface.
pub trait ToastSink: Send + Sync {
    fn push(&self, toast: Toast);
}

/// Bounded in-memory toast buffer served by the control API.
#[derive(Debug, Default)]
pub struct ToastFeed {
    toasts: Mutex<VecDeque<Toast>>,
}

impl ToastFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent toasts first.
    pub fn recent(&self, limit: usize) -> Vec<Toast> {
        let toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.iter().rev().take(limit).cloned().collect()
    }
}

impl ToastSink for ToastFeed {
    fn push(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Destructive => {
                tracing::warn!(title = %toast.title, "{}", toast.description)
            }
            ToastVariant::Default => tracing::info!(title = %toast.title, "{}", toast.description),
        }

        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        if toasts.len() == FEED_CAPACITY {
            toasts.pop_front();
        }
        toasts.push_back(toast);
    }
}
