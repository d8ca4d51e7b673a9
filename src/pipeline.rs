//! Aggregate-then-shard pipeline
//!
//! The pipeline is assembled from explicit parts: an [`Aggregator`] that turns
//! input lines into records, a [`Partitioner`] that spreads records across
//! shards, and the [`ShardedTextWriter`] that materializes them.

use crate::aggregate::{Aggregator, AggregationStats, WordCountAggregator};
use crate::config::ShardConfig;
use crate::error::ShardResult;
use crate::shard::{Partitioner, ShardedTextWriter, WriteOptions, WriteSummary};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub aggregation: AggregationStats,
    pub write: WriteSummary,
}

pub struct Pipeline<A, P> {
    aggregator: A,
    partitioner: P,
    writer: ShardedTextWriter,
}

impl<A, P> Pipeline<A, P>
where
    A: Aggregator,
    P: Partitioner,
{
    pub fn new(aggregator: A, partitioner: P, options: WriteOptions) -> ShardResult<Self> {
        Ok(Self {
            aggregator,
            partitioner,
            writer: ShardedTextWriter::new(options)?,
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.writer = self.writer.with_progress(progress);
        self
    }

    pub fn write_options(&self) -> &WriteOptions {
        self.writer.options()
    }

    /// Aggregate `lines` and write the resulting records as shards
    pub async fn run(&self, lines: &[String]) -> ShardResult<PipelineResult> {
        let aggregation = self.aggregator.aggregate(lines)?;
        info!(
            "Aggregated {} input lines into {} records",
            aggregation.stats.input_lines, aggregation.stats.distinct_keys
        );

        let write = self
            .writer
            .write(aggregation.records, &self.partitioner)
            .await?;

        Ok(PipelineResult {
            aggregation: aggregation.stats,
            write,
        })
    }
}

impl Pipeline<WordCountAggregator, Box<dyn Partitioner>> {
    /// Word-count pipeline using the configured partitioning and output settings
    pub fn word_count(
        config: &ShardConfig,
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> ShardResult<Self> {
        Self::new(
            WordCountAggregator::new(),
            config.partitioner.partitioner(),
            config.write_options(output_dir, prefix),
        )
    }
}
