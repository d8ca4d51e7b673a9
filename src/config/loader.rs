use super::{get_global_config_dir, PartialShardConfig, ShardConfig};
use crate::error::{ErrorCode, ShardError, ShardResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Builds the effective [`ShardConfig`] from files and the environment
pub struct ConfigLoader {
    global_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_path: get_global_config_dir().map(|dir| dir.join("config.toml")),
            explicit_path: None,
        }
    }

    /// Use a different global config file (or none)
    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Layer an explicit config file on top of the global one
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Load using the process environment
    pub async fn load(&self) -> ShardResult<ShardConfig> {
        self.load_with_env(|key| std::env::var(key).ok()).await
    }

    pub async fn load_with_env<F>(&self, lookup: F) -> ShardResult<ShardConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ShardConfig::new();

        if let Some(path) = &self.global_path {
            if fs::try_exists(path).await.unwrap_or(false) {
                debug!("Loading global config from {}", path.display());
                config.apply(read_config_file(path).await?);
            }
        }

        if let Some(path) = &self.explicit_path {
            if !fs::try_exists(path).await.unwrap_or(false) {
                return Err(ShardError::config_with_code(
                    ErrorCode::CONFIG_NOT_FOUND,
                    format!("Configuration file not found: {}", path.display()),
                ));
            }
            debug!("Loading config from {}", path.display());
            config.apply(read_config_file(path).await?);
        }

        config.merge_env_with(lookup)?;
        Ok(config)
    }
}

/// Read a TOML or YAML (`.yaml`/`.yml`) config file
pub async fn read_config_file(path: &Path) -> ShardResult<PartialShardConfig> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        ShardError::config_with_code(
            ErrorCode::CONFIG_PATH_ERROR,
            format!("Cannot read {}", path.display()),
        )
        .with_source(e)
    })?;
    parse_config(path, &content)
}

/// Pure: parse config file content, choosing the format from the extension
pub fn parse_config(path: &Path, content: &str) -> ShardResult<PartialShardConfig> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        if content.trim().is_empty() {
            return Ok(PartialShardConfig::default());
        }
        serde_yaml::from_str(content).map_err(|e| {
            ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_YAML,
                format!("Invalid YAML in {}", path.display()),
            )
            .with_source(e)
        })
    } else {
        toml::from_str(content).map_err(|e| {
            ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_TOML,
                format!("Invalid TOML in {}", path.display()),
            )
            .with_source(e)
        })
    }
}
