use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use dockhand_datamodel::RegistryAuth;

/// Where the stock daemon socket lives.
pub const DEFAULT_HOST: &str = "unix:///var/run/docker.sock";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    pub host: String,
    #[serde(default)]
    pub auth: Option<RegistryAuth>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            auth: None,
        }
    }
}

impl ClientConfig {
    /// `DOCKER_HOST` when set, the stock socket otherwise.
    pub fn from_env() -> Self {
        let host = std::env::var("DOCKER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned());
        Self { host, auth: None }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("loading configuration from {}", path.display());

        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("failed to read configuration file: {e}");
                return Err(e.into());
            }
        };

        let config: ClientConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }
}
