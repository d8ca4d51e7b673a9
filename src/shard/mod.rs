//! Sharded text output
//!
//! This module provides the pieces of a sharded write:
//! - `partition` - pure assignment of records to N partitions
//! - `naming` - shard file name templates and matching
//! - `writer` - parallel writer that materializes partitions as text files
//! - `reader` - discovery and read-back of written shards

pub mod naming;
pub mod partition;
pub mod reader;
pub mod writer;

pub use naming::{
    ShardFileMatcher, ShardNameTemplate, TemplateFileMatcher, DEFAULT_SHARD_TEMPLATE,
};
pub use partition::{
    assign, HashPartitioner, PartitionStrategy, Partitioner, RoundRobinPartitioner,
    ShardAssignment, MAX_NUM_SHARDS,
};
pub use reader::{
    list_shards, list_template_shards, read_records, read_shard, read_shard_lines,
};
pub use writer::{
    write_sharded_text, ShardFile, ShardedTextWriter, WriteMode, WriteOptions, WriteSummary,
    MAX_PARALLEL_WRITES,
};
