//! # shardtext
//!
//! Aggregate text into keyed records and write them as a fixed number of
//! sharded text files, one record per line.
//!
//! ## Usage
//!
//! ```bash
//! shardtext count input.txt -o /data/out -n 3
//! shardtext cat -o /data/out --sorted
//! ```
//!
//! ## Modules
//!
//! - `aggregate` - Turn input lines into `<key>: <count>` records
//! - `cli` - Argument parsing, command handlers and logging setup
//! - `config` - Layered configuration (files, environment, flags)
//! - `error` - Error types with stable error codes
//! - `pipeline` - Aggregate-then-shard pipeline
//! - `record` - The record type and its line format
//! - `shard` - Partitioning, shard naming, writing and reading back
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod shard;

pub use aggregate::{Aggregation, AggregationStats, Aggregator, PrecountedAggregator, WordCountAggregator};
pub use config::{ConfigLoader, ShardConfig};
pub use error::{ErrorCode, ShardError, ShardResult};
pub use pipeline::{Pipeline, PipelineResult};
pub use record::Record;
pub use shard::{
    assign, write_sharded_text, PartitionStrategy, Partitioner, ShardedTextWriter, WriteMode,
    WriteOptions, WriteSummary,
};
