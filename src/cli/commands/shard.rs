//! `shardtext count` and `shardtext write`

use crate::aggregate::{Aggregator, PrecountedAggregator, WordCountAggregator};
use crate::cli::args::ShardArgs;
use crate::config::ShardConfig;
use crate::pipeline::{Pipeline, PipelineResult};
use crate::shard::{ShardNameTemplate, WriteMode, WriteOptions};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// How input lines are turned into records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Free text to be word-counted
    Text,
    /// Lines that already are `<key>: <count>` records
    Records,
}

/// Apply command line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut ShardConfig, args: &ShardArgs) -> Result<()> {
    if let Some(n) = args.num_shards {
        config.num_shards = n;
    }
    if let Some(suffix) = &args.suffix {
        config.suffix = suffix.clone();
    }
    if let Some(template) = &args.template {
        config.shard_template = ShardNameTemplate::parse(template)?;
    }
    if args.skip_empty_shards {
        config.force_exact_shards = false;
    }
    if let Some(partitioner) = args.partitioner {
        config.partitioner = partitioner;
    }
    if args.fail_if_exists {
        config.write_mode = WriteMode::FailIfExists;
    }
    if let Some(max_parallel) = args.max_parallel {
        config.max_parallel_writes = max_parallel;
    }
    Ok(())
}

pub async fn run_shard_command(
    kind: InputKind,
    inputs: Vec<PathBuf>,
    args: ShardArgs,
    mut config: ShardConfig,
) -> Result<()> {
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    let target = WriteOptions::from_path_prefix(&args.output, config.num_shards)?;
    let options = config.write_options(target.output_dir, target.prefix);
    debug!("Write options: {:?}", options);

    let lines = read_input_lines(&inputs).await?;
    let progress = (!args.json && !args.no_progress && std::io::stderr().is_terminal())
        .then(|| create_progress_bar(options.num_shards));

    let result = match kind {
        InputKind::Text => {
            run_pipeline(WordCountAggregator::new(), &config, options, &lines, progress.clone())
                .await?
        }
        InputKind::Records => {
            run_pipeline(PrecountedAggregator, &config, options, &lines, progress.clone()).await?
        }
    };

    if let Some(progress) = progress {
        progress.finish_with_message(format!("{} file(s) written", result.write.files_written));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_summary(&result));
    }
    Ok(())
}

async fn run_pipeline<A: Aggregator>(
    aggregator: A,
    config: &ShardConfig,
    options: WriteOptions,
    lines: &[String],
    progress: Option<ProgressBar>,
) -> Result<PipelineResult> {
    let mut pipeline = Pipeline::new(aggregator, config.partitioner.partitioner(), options)?;
    if let Some(progress) = progress {
        pipeline = pipeline.with_progress(progress);
    }
    Ok(pipeline.run(lines).await?)
}

/// Read lines from the given files in order, or from stdin when none are given
pub async fn read_input_lines(inputs: &[PathBuf]) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    if inputs.is_empty() {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = reader.next_line().await.context("Failed to read stdin")? {
            lines.push(line);
        }
        return Ok(lines);
    }

    for input in inputs {
        let content = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read input file {}", input.display()))?;
        lines.extend(content.lines().map(str::to_string));
    }
    Ok(lines)
}

/// Pure: human readable run summary
pub fn format_summary(result: &PipelineResult) -> String {
    let write = &result.write;
    let mut output = format!(
        "Wrote {} shard file(s) with {} record(s) from {} input line(s)\n",
        write.files_written, write.records_written, result.aggregation.input_lines
    );
    for file in &write.files {
        output.push_str(&format!(
            "  {}  {} line(s)  {} bytes  sha256:{}\n",
            file.path.display(),
            file.lines,
            file.bytes,
            &file.sha256[..file.sha256.len().min(12)]
        ));
    }
    if write.empty_shards_skipped > 0 {
        output.push_str(&format!(
            "Skipped {} empty shard(s)\n",
            write.empty_shards_skipped
        ));
    }
    if write.stale_files_removed > 0 {
        output.push_str(&format!(
            "Removed {} stale shard file(s)\n",
            write.stale_files_removed
        ));
    }
    output
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} shards {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationStats;
    use crate::shard::{PartitionStrategy, ShardFile, WriteSummary};

    fn args() -> ShardArgs {
        ShardArgs {
            output: PathBuf::from("/tmp/out"),
            num_shards: None,
            suffix: None,
            template: None,
            skip_empty_shards: false,
            partitioner: None,
            fail_if_exists: false,
            max_parallel: None,
            json: false,
            no_progress: true,
        }
    }

    #[test]
    fn test_overrides_win_over_config() {
        let mut config = ShardConfig::default();
        let args = ShardArgs {
            num_shards: Some(3),
            skip_empty_shards: true,
            partitioner: Some(PartitionStrategy::RoundRobin),
            fail_if_exists: true,
            template: Some("-SS".into()),
            ..args()
        };
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.num_shards, 3);
        assert!(!config.force_exact_shards);
        assert_eq!(config.partitioner, PartitionStrategy::RoundRobin);
        assert_eq!(config.write_mode, WriteMode::FailIfExists);
        assert_eq!(config.shard_template.as_str(), "-SS");
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let mut config = ShardConfig::default();
        let args = ShardArgs {
            template: Some("nope".into()),
            ..args()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }

    #[test]
    fn test_format_summary() {
        let result = PipelineResult {
            aggregation: AggregationStats {
                input_lines: 6,
                empty_lines: 1,
                total_count: 10,
                distinct_keys: 4,
            },
            write: WriteSummary {
                num_shards: 2,
                files_written: 1,
                records_written: 4,
                empty_shards_skipped: 1,
                stale_files_removed: 0,
                files: vec![ShardFile {
                    index: 0,
                    path: PathBuf::from("out-00000-of-00002.txt"),
                    lines: 4,
                    bytes: 32,
                    sha256: "0123456789abcdef".into(),
                }],
            },
        };

        let text = format_summary(&result);
        assert!(text.starts_with("Wrote 1 shard file(s) with 4 record(s) from 6 input line(s)"));
        assert!(text.contains("sha256:0123456789ab\n"));
        assert!(text.contains("Skipped 1 empty shard(s)"));
        assert!(!text.contains("stale"));
    }
}
