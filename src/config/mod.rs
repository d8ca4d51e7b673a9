//! Configuration for sharded writes
//!
//! Values are layered from lowest to highest precedence: built-in defaults,
//! the global config file, an explicit config file, `SHARDTEXT_*` environment
//! variables, and finally command line flags.

use crate::error::{ErrorCode, ShardError, ShardResult};
use crate::shard::{
    PartitionStrategy, ShardNameTemplate, WriteMode, WriteOptions, MAX_NUM_SHARDS,
    MAX_PARALLEL_WRITES,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod loader;

pub use loader::ConfigLoader;

pub const ENV_NUM_SHARDS: &str = "SHARDTEXT_NUM_SHARDS";
pub const ENV_SUFFIX: &str = "SHARDTEXT_SUFFIX";
pub const ENV_MAX_PARALLEL: &str = "SHARDTEXT_MAX_PARALLEL";
pub const ENV_PARTITIONER: &str = "SHARDTEXT_PARTITIONER";
pub const ENV_LOG_LEVEL: &str = "SHARDTEXT_LOG_LEVEL";

/// Get the global shardtext configuration directory
pub fn get_global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "shardtext").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardConfig {
    pub num_shards: usize,
    pub suffix: String,
    pub shard_template: ShardNameTemplate,
    pub force_exact_shards: bool,
    pub partitioner: PartitionStrategy,
    pub max_parallel_writes: usize,
    pub write_mode: WriteMode,
    pub log_level: String,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            num_shards: 1,
            suffix: ".txt".to_string(),
            shard_template: ShardNameTemplate::default(),
            force_exact_shards: true,
            partitioner: PartitionStrategy::default(),
            max_parallel_writes: crate::shard::writer::DEFAULT_MAX_PARALLEL_WRITES,
            write_mode: WriteMode::default(),
            log_level: "info".to_string(),
        }
    }
}

/// A configuration file; every field is optional so files can be layered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialShardConfig {
    pub num_shards: Option<usize>,
    pub suffix: Option<String>,
    pub shard_template: Option<ShardNameTemplate>,
    pub force_exact_shards: Option<bool>,
    pub partitioner: Option<PartitionStrategy>,
    pub max_parallel_writes: Option<usize>,
    pub write_mode: Option<WriteMode>,
    pub log_level: Option<String>,
}

impl ShardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the values present in `partial`
    pub fn apply(&mut self, partial: PartialShardConfig) {
        if let Some(v) = partial.num_shards {
            self.num_shards = v;
        }
        if let Some(v) = partial.suffix {
            self.suffix = v;
        }
        if let Some(v) = partial.shard_template {
            self.shard_template = v;
        }
        if let Some(v) = partial.force_exact_shards {
            self.force_exact_shards = v;
        }
        if let Some(v) = partial.partitioner {
            self.partitioner = v;
        }
        if let Some(v) = partial.max_parallel_writes {
            self.max_parallel_writes = v;
        }
        if let Some(v) = partial.write_mode {
            self.write_mode = v;
        }
        if let Some(v) = partial.log_level {
            self.log_level = v;
        }
    }

    /// Apply `SHARDTEXT_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) -> ShardResult<()> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `SHARDTEXT_*` overrides using a custom variable lookup
    pub fn merge_env_with<F>(&mut self, lookup: F) -> ShardResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_NUM_SHARDS) {
            self.num_shards = parse_env(ENV_NUM_SHARDS, &value)?;
        }
        if let Some(value) = lookup(ENV_SUFFIX) {
            self.suffix = value;
        }
        if let Some(value) = lookup(ENV_MAX_PARALLEL) {
            self.max_parallel_writes = parse_env(ENV_MAX_PARALLEL, &value)?;
        }
        if let Some(value) = lookup(ENV_PARTITIONER) {
            self.partitioner = match value.trim() {
                "hash" => PartitionStrategy::Hash,
                "round-robin" => PartitionStrategy::RoundRobin,
                other => {
                    return Err(ShardError::config_with_code(
                        ErrorCode::CONFIG_INVALID_VALUE,
                        format!("{}: unknown partitioner {:?}", ENV_PARTITIONER, other),
                    ))
                }
            };
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> ShardResult<()> {
        if self.num_shards == 0 {
            return Err(ShardError::partition_count(0));
        }
        if self.num_shards > MAX_NUM_SHARDS {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "num_shards {} exceeds the maximum of {}",
                    self.num_shards, MAX_NUM_SHARDS
                ),
            ));
        }
        if self.max_parallel_writes == 0 || self.max_parallel_writes > MAX_PARALLEL_WRITES {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "max_parallel_writes must be between 1 and {} (got {})",
                    MAX_PARALLEL_WRITES, self.max_parallel_writes
                ),
            ));
        }
        validate_log_level(&self.log_level)?;
        if self.suffix.contains(['/', '\\']) {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_VALIDATION_FAILED,
                format!("suffix {:?} must not contain path separators", self.suffix),
            ));
        }
        Ok(())
    }

    /// Writer options for output under `output_dir` with the given file prefix
    pub fn write_options(
        &self,
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> WriteOptions {
        WriteOptions::new(output_dir, prefix, self.num_shards)
            .with_suffix(self.suffix.clone())
            .with_template(self.shard_template.clone())
            .with_force_exact_shards(self.force_exact_shards)
            .with_max_parallel_writes(self.max_parallel_writes)
            .with_write_mode(self.write_mode)
    }
}

/// Check a log filter such as `info` or `shardtext=debug,warn`.
///
/// Every comma separated directive must name a level, either alone or after
/// `target=`.
pub fn validate_log_level(level: &str) -> ShardResult<()> {
    let invalid = |reason: String| {
        ShardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("log_level {:?} is not a valid log filter: {}", level, reason),
        )
    };

    let directives: Vec<&str> = level
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    if directives.is_empty() {
        return Err(invalid("no directives".to_string()));
    }
    for directive in directives {
        let level_part = directive
            .rsplit_once('=')
            .map_or(directive, |(_, level)| level);
        level_part
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| invalid(format!("unknown level {:?}", level_part)))?;
    }

    EnvFilter::try_new(level)
        .map(|_| ())
        .map_err(|e| invalid(e.to_string()))
}

fn parse_env(key: &str, value: &str) -> ShardResult<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        ShardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("{}={:?} is not a valid number", key, value),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShardConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.force_exact_shards);
        assert_eq!(config.shard_template.as_str(), "-SSSSS-of-NNNNN");
    }

    #[test]
    fn test_apply_only_overrides_present_fields() {
        let mut config = ShardConfig::default();
        config.apply(PartialShardConfig {
            num_shards: Some(3),
            write_mode: Some(WriteMode::FailIfExists),
            ..Default::default()
        });
        assert_eq!(config.num_shards, 3);
        assert_eq!(config.write_mode, WriteMode::FailIfExists);
        assert_eq!(config.suffix, ".txt");
    }

    #[test]
    fn test_merge_env_with() {
        let env: HashMap<&str, &str> = [
            (ENV_NUM_SHARDS, "7"),
            (ENV_SUFFIX, ".out"),
            (ENV_PARTITIONER, "round-robin"),
            (ENV_LOG_LEVEL, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ShardConfig::default();
        config
            .merge_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.num_shards, 7);
        assert_eq!(config.suffix, ".out");
        assert_eq!(config.partitioner, PartitionStrategy::RoundRobin);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_parallel_writes, 4);
    }

    #[test]
    fn test_merge_env_rejects_bad_numbers() {
        let mut config = ShardConfig::default();
        let result = config.merge_env_with(|key| (key == ENV_NUM_SHARDS).then(|| "three".into()));
        assert!(matches!(result, Err(ShardError::Config { .. })));
    }

    #[test]
    fn test_validate() {
        let config = ShardConfig {
            num_shards: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShardError::PartitionCount { .. })
        ));

        let config = ShardConfig {
            suffix: "a/b".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        for config in [
            ShardConfig {
                num_shards: MAX_NUM_SHARDS + 1,
                ..Default::default()
            },
            ShardConfig {
                max_parallel_writes: MAX_PARALLEL_WRITES + 1,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(ShardError::Config {
                    code: ErrorCode::CONFIG_INVALID_VALUE,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = ShardConfig::default();
        config
            .merge_env_with(|key| (key == ENV_LOG_LEVEL).then(|| "loud".to_string()))
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ShardError::Config {
                code: ErrorCode::CONFIG_INVALID_VALUE,
                ..
            })
        ));

        let config = ShardConfig {
            log_level: "shardtext=debug,warn".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        assert!(validate_log_level("OFF").is_ok());
        assert!(validate_log_level("").is_err());
        assert!(validate_log_level("shardtext=loud").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ShardConfig {
            num_shards: 3,
            partitioner: PartitionStrategy::RoundRobin,
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("partitioner = \"round-robin\""));
        let parsed: ShardConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_write_options_carry_config() {
        let config = ShardConfig {
            num_shards: 5,
            suffix: ".csv".into(),
            force_exact_shards: false,
            ..Default::default()
        };
        let options = config.write_options("/tmp/x", "part");
        assert_eq!(options.num_shards, 5);
        assert_eq!(options.suffix, ".csv");
        assert!(!options.force_exact_shards);
        assert_eq!(options.prefix, "part");
    }
}
