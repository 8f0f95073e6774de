//! Google Authorization
//!
//! The OAuth credential record persisted by the consent flow, the file-backed
//! token store that reads it on every request, and the API-key guard in front
//! of the protected routes.

pub mod api_key;
pub mod provider;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use store::TokenStore;

/// Scopes requested during consent.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/youtube.force-ssl",
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtubepartner",
    "https://www.googleapis.com/auth/calendar",
];

pub fn default_scopes() -> Vec<String> {
    SCOPES.iter().map(|s| s.to_string()).collect()
}

// ── Credentials ─────────────────────────────────────────────────────────────

/// OAuth credential record as stored in the token file.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub token_uri: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub scopes: Vec<String>,
}

impl Credentials {
    /// Name of the first missing or empty field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("token", self.token.is_empty()),
            ("refresh_token", self.refresh_token.is_empty()),
            ("token_uri", self.token_uri.is_empty()),
            ("client_id", self.client_id.is_empty()),
            ("client_secret", self.client_secret.is_empty()),
            ("scopes", self.scopes.is_empty()),
        ]
        .into_iter()
        .find_map(|(name, missing)| missing.then_some(name))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}
