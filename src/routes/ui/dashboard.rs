use askama::Template;
use axum::extract::State;
use axum::response::{Html, Redirect};
use chrono::{DateTime, Utc};

use crate::error::{AppError, HtmlError};
use crate::models::job::JobListing;
use crate::poller::service::PollerStatus;
use crate::routes::AppState;
use crate::toast::Toast;

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    status: PollerStatus,
    last_refresh: String,
    next_poll: String,
    last_error: String,
    /// Write forms are only usable when the control API is open.
    controls: bool,
    listings: Vec<ListingRow>,
    toasts: Vec<Toast>,
}

struct ListingRow {
    id: String,
    title: String,
    category: String,
    score: String,
    budget: String,
    published: String,
    url: String,
}

impl From<&JobListing> for ListingRow {
    fn from(listing: &JobListing) -> Self {
        let (category, score) = match &listing.relevance {
            Some(r) => (r.category.clone(), format!("{:.1}", r.score)),
            None => ("-".to_string(), "-".to_string()),
        };
        Self {
            id: listing.id.clone().unwrap_or_else(|| "-".to_string()),
            title: listing.title_or_default().to_string(),
            category,
            score,
            budget: listing.budget().unwrap_or_else(|| "-".to_string()),
            published: listing.published_date.clone().unwrap_or_default(),
            url: listing.url.clone().unwrap_or_default(),
        }
    }
}

fn clock(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "never".to_string())
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, HtmlError> {
    let status = state.poller.status().await;
    let listings: Vec<ListingRow> = state
        .poller
        .latest()
        .iter()
        .map(ListingRow::from)
        .collect();

    let tmpl = DashboardTemplate {
        last_refresh: clock(status.last_refresh_at),
        next_poll: status
            .next_poll_at
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "paused".to_string()),
        last_error: status.last_error.clone().unwrap_or_default(),
        controls: state.api_token_hash.is_none(),
        status,
        listings,
        toasts: state.toasts.recent(10),
    };
    Ok(Html(
        tmpl.render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

/// Flip notifications. Failures (permission denied) already show up as a
/// toast on the page, so this always redirects back.
pub async fn toggle_notifications(State(state): State<AppState>) -> Redirect {
    let enabled = state.poller.status().await.enabled;
    if let Err(e) = state.poller.set_enabled(!enabled).await {
        tracing::warn!("Toggle from dashboard failed: {e}");
    }
    Redirect::to("/")
}

pub async fn test_notification(State(state): State<AppState>) -> Redirect {
    state.poller.send_test_notification();
    Redirect::to("/")
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    if let Err(e) = state.poller.refresh().await {
        tracing::warn!("Manual refresh failed: {e}");
    }
    Redirect::to("/")
}
