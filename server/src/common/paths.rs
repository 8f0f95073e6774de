//! Path Utilities
//!
//! Default locations under `~/.gbridge/`.

use std::path::PathBuf;

/// Get the gbridge base directory (`~/.gbridge/`)
pub fn gbridge_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".gbridge"))
}

/// Get a path within the gbridge directory
pub fn gbridge_path(relative_path: &str) -> Result<PathBuf, String> {
    Ok(gbridge_dir()?.join(relative_path))
}

/// Default OAuth token file
pub fn default_token_file() -> Result<PathBuf, String> {
    gbridge_path("token.json")
}

/// Default directory for downloaded attachments
pub fn default_attachment_dir() -> Result<PathBuf, String> {
    gbridge_path("attachments")
}
