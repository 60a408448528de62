use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;

use crate::error::AppError;
use crate::notify::{
    ClickCallback, NotificationCenter, NotificationHandle, NotificationSpec, Permission,
};

const APP_NAME: &str = "relevance-watch";
const CLICK_ACTION: &str = "default";

/// Desktop notifications through the freedesktop `notify-send` tool.
///
/// Each notification runs `notify-send --wait` so that a click on the default
/// action can be reported back. Closing the handle terminates that process.
pub struct DesktopNotifier {
    binary: PathBuf,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_binary("notify-send")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn available(&self) -> bool {
        if self.binary.components().count() > 1 {
            return self.binary.is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(&self.binary).is_file()))
            .unwrap_or(false)
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationCenter for DesktopNotifier {
    fn query_permission(&self) -> Permission {
        if self.available() {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn request_permission(&self) -> Permission {
        // There is no prompt on the desktop: the tool is either there or not.
        self.query_permission()
    }

    fn show(&self, spec: &NotificationSpec) -> Result<Box<dyn NotificationHandle>, AppError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg(format!("--app-name={APP_NAME}"))
            .arg("--wait")
            .arg(format!("--action={CLICK_ACTION}=Open"))
            .arg(format!("--hint=string:x-dunst-stack-tag:{}", spec.tag));
        if let Some(icon) = &spec.icon {
            cmd.arg(format!("--icon={icon}"));
        }
        cmd.arg(&spec.title)
            .arg(&spec.body)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            AppError::Internal(format!("Failed to run {}: {e}", self.binary.display()))
        })?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Internal("notify-send stdout not captured".to_string()))?;

        let click: Arc<Mutex<Option<ClickCallback>>> = Arc::new(Mutex::new(None));
        let (close_tx, close_rx) = oneshot::channel::<()>();

        let click_slot = click.clone();
        tokio::spawn(async move {
            let read_action = async move {
                let mut action = String::new();
                stdout.read_to_string(&mut action).await.map(|_| action)
            };
            tokio::select! {
                read = read_action => {
                    if read.is_ok_and(|action| action.trim() == CLICK_ACTION) {
                        let callback = click_slot.lock().unwrap_or_else(|e| e.into_inner()).take();
                        if let Some(callback) = callback {
                            callback();
                        }
                    }
                }
                _ = close_rx => {
                    let _ = child.start_kill();
                }
            }
            let _ = child.wait().await;
        });

        Ok(Box::new(DesktopHandle {
            click,
            close_tx: Mutex::new(Some(close_tx)),
        }))
    }
}

struct DesktopHandle {
    click: Arc<Mutex<Option<ClickCallback>>>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl NotificationHandle for DesktopHandle {
    fn close(&self) {
        if let Some(tx) = self.close_tx.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = tx.send(());
        }
    }

    fn on_click(&self, callback: ClickCallback) {
        *self.click.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);
    }
}
