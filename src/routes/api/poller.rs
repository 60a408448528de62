use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::job::JobListing;
use crate::poller::CycleOutcome;
use crate::poller::service::{PollerStatus, TestNotification};
use crate::routes::AppState;
use crate::toast::Toast;

#[derive(Debug, Deserialize)]
pub struct UpdatePoller {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToastQuery {
    pub limit: Option<usize>,
}

pub async fn status(State(state): State<AppState>) -> Json<PollerStatus> {
    Json(state.poller.status().await)
}

pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdatePoller>,
) -> Result<Json<PollerStatus>, AppError> {
    let status = state.poller.set_enabled(input.enabled).await?;
    Ok(Json(status))
}

/// POST /api/v1/poller/refresh
///
/// Runs one cycle immediately. New listings found here are notified and
/// recorded exactly as on a scheduled poll.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<CycleOutcome>, AppError> {
    let outcome = state.poller.refresh().await?;
    Ok(Json(outcome))
}

/// POST /api/v1/poller/test
///
/// Sends a sample listing through the normal notification path so the
/// operator can check that system notifications reach the desktop.
pub async fn test_notification(State(state): State<AppState>) -> Json<TestNotification> {
    Json(state.poller.send_test_notification())
}

pub async fn listings(State(state): State<AppState>) -> Json<Vec<JobListing>> {
    Json(state.poller.latest())
}

pub async fn toasts(
    State(state): State<AppState>,
    Query(query): Query<ToastQuery>,
) -> Json<Vec<Toast>> {
    let limit = query.limit.unwrap_or(20).min(50);
    Json(state.toasts.recent(limit))
}
