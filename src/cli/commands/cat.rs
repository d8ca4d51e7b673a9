//! `shardtext cat`

use crate::config::ShardConfig;
use crate::shard::{list_template_shards, read_shard, ShardNameTemplate, WriteOptions};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Print every line of the shards under `output`, shard by shard
pub async fn run_cat_command(
    output: PathBuf,
    suffix: Option<String>,
    template: Option<String>,
    sorted: bool,
    config: &ShardConfig,
) -> Result<()> {
    let template = match template {
        Some(raw) => ShardNameTemplate::parse(&raw)?,
        None => config.shard_template.clone(),
    };
    let lines = collect_lines(output, suffix, &template, sorted, config).await?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Gather the lines `cat` would print
pub async fn collect_lines(
    output: PathBuf,
    suffix: Option<String>,
    template: &ShardNameTemplate,
    sorted: bool,
    config: &ShardConfig,
) -> Result<Vec<String>> {
    let target = WriteOptions::from_path_prefix(&output, 1)?;
    let suffix = suffix.unwrap_or_else(|| config.suffix.clone());

    let shards =
        list_template_shards(&target.output_dir, &target.prefix, &suffix, template).await?;
    if shards.is_empty() {
        warn!(
            "No shards named {}{}{} in {}",
            target.prefix,
            template,
            suffix,
            target.output_dir.display()
        );
    }

    let mut lines = Vec::new();
    for path in &shards {
        debug!("Reading shard {}", path.display());
        lines.extend(read_shard(path).await?);
    }
    if sorted {
        lines.sort();
    }
    Ok(lines)
}
