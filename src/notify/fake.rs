use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::notify::{
    ClickCallback, NotificationCenter, NotificationHandle, NotificationSpec, Permission,
};

/// Recording notifier for tests.
pub struct FakeNotifier {
    permission: Mutex<Permission>,
    /// State the next permission request resolves to.
    request_outcome: Permission,
    /// Any notification whose body contains this text fails to show.
    fail_on: Mutex<Option<String>>,
    shown: Mutex<Vec<NotificationSpec>>,
    requests: Mutex<usize>,
}

impl FakeNotifier {
    pub fn granted() -> Self {
        Self::new(Permission::Granted, Permission::Granted)
    }

    pub fn new(current: Permission, request_outcome: Permission) -> Self {
        Self {
            permission: Mutex::new(current),
            request_outcome,
            fail_on: Mutex::new(None),
            shown: Mutex::new(Vec::new()),
            requests: Mutex::new(0),
        }
    }

    pub fn fail_when_body_contains(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    pub fn shown(&self) -> Vec<NotificationSpec> {
        self.shown.lock().unwrap().clone()
    }

    pub fn permission_requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

#[async_trait]
impl NotificationCenter for FakeNotifier {
    fn query_permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        *self.requests.lock().unwrap() += 1;
        *self.permission.lock().unwrap() = self.request_outcome;
        self.request_outcome
    }

    fn show(&self, spec: &NotificationSpec) -> Result<Box<dyn NotificationHandle>, AppError> {
        if let Some(needle) = self.fail_on.lock().unwrap().as_deref()
            && spec.body.contains(needle)
        {
            return Err(AppError::Internal("notification backend refused".to_string()));
        }
        self.shown.lock().unwrap().push(spec.clone());
        Ok(Box::new(FakeHandle))
    }
}

struct FakeHandle;

impl NotificationHandle for FakeHandle {
    fn close(&self) {}

    fn on_click(&self, _callback: ClickCallback) {}
}
