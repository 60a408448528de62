pub mod api;
pub mod ui;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::backend::BackendClient;
use crate::poller::service::PollerService;
use crate::toast::ToastFeed;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<PollerService>,
    pub toasts: Arc<ToastFeed>,
    pub backend: BackendClient,
    /// SHA-256 hex of the control API token; `None` leaves the API open.
    pub api_token_hash: Option<Arc<str>>,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.poller.settings_ready().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(ui::router(state.clone()))
        .merge(api::router(state.clone()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::hash_token;
    use crate::notify::Permission;
    use crate::notify::fake::FakeNotifier;
    use crate::poller::RelevancePoller;
    use crate::poller::testing::{ScriptedSource, listings};
    use crate::settings::{MemorySettingsStore, NotificationSettings};

    const TOKEN: &str = "test-token";

    async fn app(notifier: FakeNotifier, backend_url: &str, token: Option<&str>) -> (Router, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new());
        let notifier = Arc::new(notifier);
        let toasts = Arc::new(ToastFeed::new());
        let settings = NotificationSettings::load(Arc::new(MemorySettingsStore::new()))
            .await
            .unwrap();
        let poller = RelevancePoller::new(source.clone(), notifier.clone(), toasts.clone(), false);
        let service = PollerService::new(
            poller,
            notifier,
            toasts.clone(),
            settings,
            Duration::from_secs(90),
        );

        let state = AppState {
            poller: Arc::new(service),
            toasts,
            backend: BackendClient::new(backend_url, Duration::from_secs(5)).unwrap(),
            api_token_hash: token.map(|t| Arc::from(hash_token(t))),
        };
        (router(state), source)
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoints() {
        let (app, _) = app(FakeNotifier::granted(), "http://127.0.0.1:9", None).await;

        let resp = app.clone().oneshot(get_req("/healthz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get_req("/readyz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requires_token_when_configured() {
        let (app, _) = app(FakeNotifier::granted(), "http://127.0.0.1:9", Some(TOKEN)).await;

        let resp = app.clone().oneshot(get_req("/api/v1/poller")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::get("/api/v1/poller")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let right = Request::get("/api/v1/poller")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(right).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let status = body_json(resp).await;
        assert_eq!(status["enabled"], json!(false));
        assert_eq!(status["poll_interval_secs"], json!(90));
    }

    #[tokio::test]
    async fn enabling_without_permission_is_forbidden() {
        let (app, _) = app(
            FakeNotifier::new(Permission::Denied, Permission::Denied),
            "http://127.0.0.1:9",
            None,
        )
        .await;

        let req = Request::put("/api/v1/poller")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "enabled": true }).to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app.oneshot(get_req("/api/v1/toasts?limit=1")).await.unwrap();
        let toasts = body_json(resp).await;
        assert_eq!(toasts[0]["variant"], json!("destructive"));
    }

    #[tokio::test]
    async fn refresh_returns_outcome_and_listings() {
        let (app, source) = app(FakeNotifier::granted(), "http://127.0.0.1:9", None).await;
        source.push_ok(listings(&["A", "B"]));

        let resp = app
            .clone()
            .oneshot(Request::post("/api/v1/poller/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "kind": "disabled", "fetched": 2 }));

        let resp = app.oneshot(get_req("/api/v1/listings")).await.unwrap();
        let listings = body_json(resp).await;
        assert_eq!(listings.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn refresh_failure_is_bad_gateway() {
        let (app, source) = app(FakeNotifier::granted(), "http://127.0.0.1:9", None).await;
        source.push_err("backend down");

        let resp = app
            .oneshot(Request::post("/api/v1/poller/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn relevance_status_is_proxied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/relevance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_enabled_override": true,
                "is_within_schedule": false,
                "effective_status": true,
            })))
            .mount(&server)
            .await;
        let (app, _) = app(FakeNotifier::granted(), &server.uri(), None).await;

        let resp = app.oneshot(get_req("/api/v1/relevance")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["effective_status"], json!(true));
    }

    #[tokio::test]
    async fn dashboard_actions_require_token_when_configured() {
        let (app, _) = app(FakeNotifier::granted(), "http://127.0.0.1:9", Some(TOKEN)).await;

        for uri in ["/notifications/toggle", "/notifications/test", "/refresh"] {
            let resp = app
                .clone()
                .oneshot(Request::post(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let status = Request::get("/api/v1/poller")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(status).await.unwrap();
        assert_eq!(body_json(resp).await["enabled"], json!(false));

        let toggle = Request::post("/notifications/toggle")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(toggle).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let resp = app.oneshot(get_req("/")).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!html.contains("action=\"/notifications/toggle\""));
    }

    #[tokio::test]
    async fn test_notification_endpoint() {
        let notifier = FakeNotifier::granted();
        let (app, _) = app(notifier, "http://127.0.0.1:9", None).await;

        let resp = app
            .clone()
            .oneshot(Request::post("/api/v1/poller/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "delivered": true, "permission": "granted" })
        );

        let resp = app.clone().oneshot(get_req("/api/v1/toasts")).await.unwrap();
        let toasts = body_json(resp).await;
        assert_eq!(toasts.as_array().unwrap().len(), 1);
        assert_eq!(toasts[0]["description"], json!("Test Job"));

        let resp = app.oneshot(get_req("/api/v1/poller")).await.unwrap();
        assert_eq!(body_json(resp).await["observed_count"], json!(0));
    }

    #[tokio::test]
    async fn dashboard_renders() {
        let (app, source) = app(FakeNotifier::granted(), "http://127.0.0.1:9", None).await;
        let mut featured = listings(&["A"]);
        featured[0].title = Some("Rust <script> engineer".to_string());
        source.push_ok(featured);
        app.clone()
            .oneshot(Request::post("/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let resp = app.oneshot(get_req("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Strong-match jobs"));
        assert!(html.contains("Rust &#60;script&#62; engineer") || html.contains("Rust &lt;script&gt; engineer"));
    }
}
