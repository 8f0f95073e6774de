mod auth;
mod captions;
mod common;
mod config;
mod google;
mod proxy;
mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use gbridge_protocol::ApiClient;

pub use config::{Config, ConfigError};

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub token_file: Option<PathBuf>,
    pub attachment_dir: Option<PathBuf>,
    pub watch: bool,
}

impl Overrides {
    fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            "BIND_ADDR" => self.bind.clone(),
            "TOKEN_FILE" => self.token_file.as_ref().map(|p| p.display().to_string()),
            "ATTACHMENT_DIR" => self.attachment_dir.as_ref().map(|p| p.display().to_string()),
            "WATCH_ATTACHMENTS" if self.watch => Some("true".to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Start the HTTP server (and the attachment watcher when enabled) and run
/// until Ctrl-C.
pub async fn run(overrides: Overrides) -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_lookup(|key| overrides.lookup(key)).context("invalid configuration")?;
    tracing::info!(?config, "Starting gbridge");
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; protected endpoints will answer 500");
    }

    let state = proxy::AppState::new(config.clone()).map_err(anyhow::Error::msg)?;
    let server = Arc::new(proxy::ProxyServer::new(state));
    let listener = server
        .bind()
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    if config.watch_attachments {
        let client = ApiClient::new(&config.base_url, config.api_key.as_deref())?;
        watcher::spawn_attachment_watcher(client, config.watch_interval, server.shutdown_receiver());
    }

    {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received");
                server.shutdown();
            }
        });
    }

    server.serve(listener).await?;
    Ok(())
}
