pub mod poller;
pub mod relevance;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_api_token;
use crate::routes::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // Local poller
        .route("/poller", get(poller::status).put(poller::update))
        .route("/poller/refresh", post(poller::refresh))
        .route("/poller/test", post(poller::test_notification))
        .route("/listings", get(poller::listings))
        .route("/toasts", get(poller::toasts))
        // Backend relevance schedule
        .route("/relevance", get(relevance::status).put(relevance::update))
        .route("/relevance/process", post(relevance::process))
        .layer(middleware::from_fn_with_state(state, require_api_token));

    Router::new().nest("/api/v1", protected)
}
