//! CLI argument structures

use crate::shard::PartitionStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Count words and write the results as a fixed number of text shards
#[derive(Parser)]
#[command(name = "shardtext")]
#[command(about = "shardtext - Write aggregated records as a fixed number of text shards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a configuration file (.toml, .yaml or .yml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count words in the input and write the counts as shards
    Count {
        /// Input text files (reads stdin when omitted)
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shard: ShardArgs,
    },

    /// Shard lines that are already "<key>: <count>" records
    Write {
        /// Input record files (reads stdin when omitted)
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shard: ShardArgs,
    },

    /// Print every line of the shards written under an output prefix
    Cat {
        /// Output path prefix used when writing (e.g. /data/out)
        #[arg(short, long)]
        output: PathBuf,

        /// Shard file suffix (defaults to the configured suffix)
        #[arg(long)]
        suffix: Option<String>,

        /// Shard name template used when writing (defaults to the configured template)
        #[arg(long)]
        template: Option<String>,

        /// Sort lines before printing
        #[arg(long)]
        sorted: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Flags shared by the commands that write shards
#[derive(Args, Debug, Clone)]
pub struct ShardArgs {
    /// Output path prefix; /data/out produces /data/out-00000-of-00003.txt and so on
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of shards to write
    #[arg(short = 'n', long)]
    pub num_shards: Option<usize>,

    /// Shard file suffix
    #[arg(long)]
    pub suffix: Option<String>,

    /// Shard name template; S runs are the shard index, N runs the shard count
    #[arg(long)]
    pub template: Option<String>,

    /// Do not create files for shards that receive no records
    #[arg(long)]
    pub skip_empty_shards: bool,

    /// How records are spread across shards
    #[arg(long, value_enum)]
    pub partitioner: Option<PartitionStrategy>,

    /// Fail instead of replacing existing shards
    #[arg(long)]
    pub fail_if_exists: bool,

    /// Maximum number of shards written concurrently
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
