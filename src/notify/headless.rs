use async_trait::async_trait;

use crate::error::AppError;
use crate::notify::{
    ClickCallback, NotificationCenter, NotificationHandle, NotificationSpec, Permission,
};

/// Notifier for hosts without a desktop session: notifications go to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationCenter for LogNotifier {
    fn query_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, spec: &NotificationSpec) -> Result<Box<dyn NotificationHandle>, AppError> {
        tracing::info!(tag = %spec.tag, "{}: {}", spec.title, spec.body);
        Ok(Box::new(LogHandle))
    }
}

struct LogHandle;

impl NotificationHandle for LogHandle {
    fn close(&self) {}

    // Log lines cannot be clicked.
    fn on_click(&self, _callback: ClickCallback) {}
}
