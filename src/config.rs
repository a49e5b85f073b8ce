//! Configuration loading for the controller binary.
//!
//! Modeled on zeekoe's `Config::load(path) -> Result<Config, anyhow::Error>`
//! shape (`toml::from_str` over a file read), expanded from the protocol's single
//! `[server] ip` key to also carry the liveness period, frame size ceiling,
//! and artifact directory root, each defaulted the way zeekoe defaults
//! optional fields (`#[serde(default = "...")]` pointing at `defaults.rs`).

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::defaults;
use crate::error::ConfigError;

/// The controller's `config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
#[non_exhaustive]
pub struct Config {
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
#[non_exhaustive]
pub struct ServerConfig {
    /// The address the controller binds to. Port is not configurable (spec
    /// §6: "Port is hard-coded to 999").
    pub ip: IpAddr,

    #[serde(default = "defaults::shared::liveness_period", with = "humantime_serde")]
    pub liveness_period: Duration,

    #[serde(default = "defaults::shared::max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "defaults::controller::data_dir")]
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads and parses `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_minimal_document_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[server]\nip = \"127.0.0.1\"\n")
            .await
            .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.server.ip, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(config.server.liveness_period, defaults::shared::liveness_period());
        assert_eq!(config.server.max_frame_bytes, defaults::shared::max_frame_bytes());
    }

    #[tokio::test]
    async fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[server]\nip = \"127.0.0.1\"\nbogus = 1\n")
            .await
            .unwrap();

        assert!(matches!(
            Config::load(&path).await,
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("nope.toml")).await,
            Err(ConfigError::Unreadable { .. })
        ));
    }
}
