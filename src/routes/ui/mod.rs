pub mod dashboard;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_api_token;
use crate::routes::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    // Forms post without an Authorization header, so once a token is
    // configured these routes reject them and the page hides its controls.
    let actions = Router::new()
        .route("/notifications/toggle", post(dashboard::toggle_notifications))
        .route("/notifications/test", post(dashboard::test_notification))
        .route("/refresh", post(dashboard::refresh))
        .layer(middleware::from_fn_with_state(state, require_api_token));

    Router::new().route("/", get(dashboard::index)).merge(actions)
}
