//! Durable storage for the single refreshable Spotify credential.
//!
//! One value under one fixed name, surviving restarts. Writes go to a temp
//! file first, then rename.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Fixed key the credential is stored under.
const TOKEN_FILE_NAME: &str = "spotify_refresh_token";

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(config_dir: &Path) -> Self {
        Self { path: config_dir.join(TOKEN_FILE_NAME) }
    }

    /// Read the stored credential. `None` if nothing has been stored yet.
    pub async fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read token file: {}", self.path.display()))?;
        let token = raw.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    /// Persist a (possibly rotated) credential, replacing any previous one.
    pub async fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token).await.with_context(|| {
            format!("Failed to write token file: {}", tmp.display())
        })?;
        fs::rename(&tmp, &self.path).await.with_context(|| {
            format!("Failed to move token file into place: {}", self.path.display())
        })?;

        debug!(path = %self.path.display(), "Stored refresh token");
        Ok(())
    }

    /// Remove the stored credential. Called when the identity provider
    /// rejects it; the next startup requires re-authorization.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Cleared stored refresh token");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to remove token file: {}", self.path.display())
            }),
        }
    }
}
