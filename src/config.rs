use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "relevance-watch",
    about = "Watches strong-match job listings and notifies on new arrivals"
)]
pub struct Config {
    /// Base URL of the scoring backend
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8001")]
    pub backend_url: String,

    /// Timeout for backend requests, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Postgres URL for persisted settings; a local JSON file is used when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Settings file used when no database is configured
    #[arg(long, env = "SETTINGS_FILE", default_value = "relevance-watch.json")]
    pub settings_file: PathBuf,

    /// Where system notifications go
    #[arg(long, env = "NOTIFIER", value_enum, default_value = "desktop")]
    pub notifier: NotifierKind,

    /// Icon shown with desktop notifications
    #[arg(long, env = "NOTIFICATION_ICON")]
    pub notification_icon: Option<String>,

    /// SHA-256 hex of the control API token (see `gen-token`)
    #[arg(long, env = "API_TOKEN_HASH")]
    pub api_token_hash: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// freedesktop notifications through notify-send
    Desktop,
    /// Write notifications to the log only
    Log,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the poller and the control surface (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,

        /// Poll interval in seconds
        #[arg(long, env = "POLL_INTERVAL", default_value = "90")]
        poll_interval: u64,
    },
    /// Show the backend's relevance schedule status
    Status,
    /// Override the backend's relevance schedule
    Schedule {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Ask the backend to score newly ingested jobs now
    ProcessJobs,
    /// Generate a control API token and print it with its hash
    GenToken,
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            poll_interval: std::env::var("POLL_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
        })
    }
}
