//! Configuration management for cadir

pub mod schema;

pub use schema::Config;

use crate::error::{CadirError, CadirResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name of the project-local config
pub const LOCAL_CONFIG_NAME: &str = ".cadir.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cadir")
            .join("config.toml")
    }

    /// Find the nearest `.cadir.toml` in `start` or any of its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> CadirResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        Self::load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    ///
    /// Relative paths inside the file are anchored at the file's directory.
    pub async fn load_from_file(path: &Path) -> CadirResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CadirError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let config: Config = toml::from_str(&content).map_err(|e| CadirError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    /// Load the global config and overlay a project-local one if given
    pub async fn load_merged(&self, local: Option<&Path>) -> CadirResult<Config> {
        let global = self.load().await?;

        match local {
            Some(path) => {
                debug!("Merging local config {}", path.display());
                let local = Self::load_from_file(path).await?;
                Ok(global.merge(local))
            }
            None => Ok(global),
        }
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
