//! `shardtext config`

use crate::config::ShardConfig;
use anyhow::{Context, Result};

pub fn run_config_command(config: &ShardConfig) -> Result<()> {
    print!("{}", render_config(config)?);
    Ok(())
}

/// Render the effective configuration as TOML
pub fn render_config(config: &ShardConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}
