//! Token Store
//!
//! The credential record lives in a single JSON file. It is read on every
//! request and only ever written wholesale by the OAuth callback.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Credentials;
use crate::common::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the stored credentials.
    ///
    /// A missing file is `TokenNotFound` (401); unreadable, malformed or
    /// incomplete content is `TokenInvalidFormat` (500).
    pub async fn load(&self) -> AppResult<Credentials> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::token_not_found()),
            Err(e) => return Err(AppError::token_invalid_format(e)),
        };

        let creds: Credentials = serde_json::from_str(&data).map_err(AppError::token_invalid_format)?;
        if let Some(field) = creds.missing_field() {
            return Err(AppError::token_invalid_format(format!("missing field '{}'", field)));
        }

        debug!("Loaded credentials from {:?}", self.path);
        Ok(creds)
    }

    /// Overwrite the token file with `creds`.
    pub async fn save(&self, creds: &Credentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create token directory: {}", e)))?;
            }
        }

        let json = serde_json::to_string_pretty(creds)
            .map_err(|e| AppError::internal(format!("Failed to serialize token: {}", e)))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AppError::internal(format!("Failed to write token file: {}", e)))?;

        // Owner-only: the file holds a refresh token and client secret
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| AppError::internal(format!("Failed to set token permissions: {}", e)))?;
        }

        info!("Token saved to {:?}", self.path);
        Ok(())
    }
}
