// System notification capability.
// The poller talks to whatever can show a notification on this host through
// `NotificationCenter`; concrete backends live in the submodules.

mod desktop;
#[cfg(test)]
pub mod fake;
mod headless;

pub use desktop::DesktopNotifier;
pub use headless::LogNotifier;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; a request may still grant it.
    Prompt,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Prompt => "prompt",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSpec {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    /// Notifications sharing a tag replace each other where the platform allows.
    pub tag: String,
}

pub type ClickCallback = Box<dyn Fn() + Send + Sync>;

/// A notification that is currently on screen.
pub trait NotificationHandle: Send + Sync {
    fn close(&self);

    fn on_click(&self, callback: ClickCallback);
}

#[async_trait]
pub trait NotificationCenter: Send + Sync {
    fn query_permission(&self) -> Permission;

    /// Ask for permission. Returns the resulting state.
    async fn request_permission(&self) -> Permission;

    fn show(&self, spec: &NotificationSpec) -> Result<Box<dyn NotificationHandle>, AppError>;
}
