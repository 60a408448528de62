mod auth;
mod backend;
mod config;
mod db;
mod error;
mod models;
mod notify;
mod poller;
mod routes;
mod settings;
mod toast;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::backend::BackendClient;
use crate::config::{Command, Config, NotifierKind, Switch};
use crate::notify::{DesktopNotifier, LogNotifier, NotificationCenter};
use crate::poller::RelevancePoller;
use crate::poller::service::PollerService;
use crate::routes::AppState;
use crate::settings::{FileSettingsStore, NotificationSettings, PgSettingsStore, SettingsStore};
use crate::toast::ToastFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let backend = BackendClient::new(
        &config.backend_url,
        Duration::from_secs(config.request_timeout),
    )?;
    tracing::debug!("Backend at {}", backend.base_url());

    match config.resolved_command() {
        Command::Serve {
            listen_addr,
            poll_interval,
        } => serve(&config, backend, &listen_addr, poll_interval).await,
        Command::Status => {
            let status = backend.relevance_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Schedule { state } => {
            let status = backend.toggle_relevance(state == Switch::On).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::ProcessJobs => {
            let result = backend.process_new_jobs().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::GenToken => {
            let token = auth::generate_token();
            println!("token:          {token}");
            println!("API_TOKEN_HASH: {}", auth::hash_token(&token));
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relevance_watch=info,tower_http=info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn settings_store(config: &Config) -> anyhow::Result<Arc<dyn SettingsStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url).await?;
            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgSettingsStore::new(pool)))
        }
        None => {
            let store = FileSettingsStore::new(&config.settings_file);
            tracing::info!("Using settings file {}", store.path().display());
            Ok(Arc::new(store))
        }
    }
}

async fn serve(
    config: &Config,
    backend: BackendClient,
    listen_addr: &str,
    poll_interval: u64,
) -> anyhow::Result<()> {
    let store = settings_store(config).await?;
    let settings = NotificationSettings::load(store).await?;

    let notifier: Arc<dyn NotificationCenter> = match config.notifier {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new()),
        NotifierKind::Log => Arc::new(LogNotifier),
    };
    let toasts = Arc::new(ToastFeed::new());

    let mut poller = RelevancePoller::new(
        Arc::new(backend.clone()),
        notifier.clone(),
        toasts.clone(),
        settings.enabled(),
    );
    if let Some(icon) = &config.notification_icon {
        poller = poller.with_icon(icon.clone());
    }

    let service = Arc::new(PollerService::new(
        poller,
        notifier,
        toasts.clone(),
        settings,
        Duration::from_secs(poll_interval.max(1)),
    ));
    service.start().await;

    let state = AppState {
        poller: service.clone(),
        toasts,
        backend,
        api_token_hash: config.api_token_hash.as_deref().map(Arc::from),
    };
    if state.api_token_hash.is_none() {
        tracing::warn!("No API_TOKEN_HASH configured, control API is unauthenticated");
    }

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting gracefully");
        })
        .await?;

    service.shutdown().await;
    Ok(())
}
