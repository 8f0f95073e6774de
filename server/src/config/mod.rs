//! Server configuration
//!
//! Built once at startup from environment variables (after `.env` is loaded)
//! with command-line flags taking precedence, then shared read-only.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use gbridge_protocol::parse_lenient_bool;

use crate::common::paths;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8011";
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid {key} '{value}': expected a number of seconds")]
    InvalidInterval { key: &'static str, value: String },

    #[error("invalid {key} '{value}': expected a boolean")]
    InvalidBool { key: &'static str, value: String },

    #[error("{0}")]
    Paths(String),
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub token_file: PathBuf,
    pub attachment_dir: PathBuf,
    /// Raw client-secret JSON (`{"web": …}` or `{"installed": …}`)
    pub google_credentials: Option<String>,
    pub api_key: Option<String>,
    /// Externally reachable root of this server
    pub base_url: String,
    pub oauth_redirect_uri: String,
    pub youtube_base_url: String,
    pub watch_attachments: bool,
    pub watch_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_raw.clone(),
                source,
            })?;

        let token_file = match get("TOKEN_FILE") {
            Some(p) => PathBuf::from(p),
            None => paths::default_token_file().map_err(ConfigError::Paths)?,
        };
        let attachment_dir = match get("ATTACHMENT_DIR") {
            Some(p) => PathBuf::from(p),
            None => paths::default_attachment_dir().map_err(ConfigError::Paths)?,
        };

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();
        let oauth_redirect_uri =
            get("OAUTH_REDIRECT_URI").unwrap_or_else(|| format!("{}/oauth2callback", base_url));
        let youtube_base_url = get("YOUTUBE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let watch_attachments = match get("WATCH_ATTACHMENTS") {
            Some(v) => parse_lenient_bool(&v).ok_or(ConfigError::InvalidBool {
                key: "WATCH_ATTACHMENTS",
                value: v,
            })?,
            None => false,
        };
        let watch_interval = match get("WATCH_INTERVAL_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidInterval {
                        key: "WATCH_INTERVAL_SECS",
                        value: v,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_WATCH_INTERVAL_SECS),
        };

        Ok(Self {
            bind_addr,
            token_file,
            attachment_dir,
            google_credentials: get("GOOGLE_CREDENTIALS"),
            api_key: get("API_KEY"),
            base_url,
            oauth_redirect_uri,
            youtube_base_url,
            watch_attachments,
            watch_interval,
        })
    }
}

// Secrets stay out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "[REDACTED]" } else { "<unset>" };
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("token_file", &self.token_file)
            .field("attachment_dir", &self.attachment_dir)
            .field("google_credentials", &redact(&self.google_credentials))
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("oauth_redirect_uri", &self.oauth_redirect_uri)
            .field("youtube_base_url", &self.youtube_base_url)
            .field("watch_attachments", &self.watch_attachments)
            .field("watch_interval", &self.watch_interval)
            .finish()
    }
}
