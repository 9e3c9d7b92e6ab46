//! Key/secret pairs persisted as `{"Token": "...", "Secret": "..."}`.
//!
//! The same shape holds the application's API key and secret and the cached
//! user access token.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::error::AuthError;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Secret")]
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| AuthError::ReadCredentials {
                path: path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&contents).map_err(|source| AuthError::ParseCredentials {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write to `path`, readable by the owner only.
    pub async fn save(&self, path: &Path) -> Result<(), AuthError> {
        let save_err = |source| AuthError::SaveCredentials {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(save_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other).map_err(save_err)?;
        fs::write(path, json).await.map_err(save_err)?;
        #[cfg(unix)]
        {
            // Token files grant account access
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).await.map_err(save_err)?;
        }
        tracing::debug!("Saved credentials to {}", path.display());
        Ok(())
    }
}
