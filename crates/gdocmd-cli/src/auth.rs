//! Bearer token lookup
//!
//! The browser OAuth flow and token refresh live outside this tool; we only
//! read an access token that something else already obtained.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable holding an access token directly
pub const TOKEN_ENV: &str = "GDOCMD_ACCESS_TOKEN";

/// Environment variable pointing at a token JSON file
pub const TOKEN_FILE_ENV: &str = "GOOGLE_DRIVE_TOKEN_FILE";

const DEFAULT_TOKEN_FILE: &str = ".google-drive-upload-token.json";

/// Resolve the access token: `$GDOCMD_ACCESS_TOKEN`, then the token file
pub fn access_token(configured_file: Option<&Path>) -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV)
        && !token.trim().is_empty()
    {
        log::debug!("Using access token from ${}", TOKEN_ENV);
        return Ok(token.trim().to_string());
    }

    let Some(path) = token_file(configured_file) else {
        bail!(
            "No access token: set ${} or point [auth] token_file at a token JSON file",
            TOKEN_ENV
        );
    };
    log::debug!("Reading access token from {}", path.display());
    read_token_file(&path)
}

/// Token file location: config, then `$GOOGLE_DRIVE_TOKEN_FILE`, then `~/`
fn token_file(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(expand_home(path));
    }
    if let Ok(path) = std::env::var(TOKEN_FILE_ENV)
        && !path.is_empty()
    {
        return Some(expand_home(Path::new(&path)));
    }
    home_dir().map(|home| home.join(DEFAULT_TOKEN_FILE))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Extract `token` or `access_token` from a token JSON file
pub fn read_token_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
    token_from_json(&content)
        .with_context(|| format!("Invalid token file: {}", path.display()))
}

fn token_from_json(content: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(content).context("Not valid JSON")?;
    ["token", "access_token"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
        .context("No \"token\" or \"access_token\" field")
}
