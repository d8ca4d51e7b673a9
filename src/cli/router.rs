//! Command routing and execution

use crate::cli::args::Commands;
use crate::cli::commands::*;
use crate::config::ShardConfig;
use anyhow::Result;

/// Execute a CLI command with the loaded configuration
pub async fn execute_command(command: Commands, config: ShardConfig) -> Result<()> {
    match command {
        Commands::Count { inputs, shard } => {
            run_shard_command(InputKind::Text, inputs, shard, config).await
        }
        Commands::Write { inputs, shard } => {
            run_shard_command(InputKind::Records, inputs, shard, config).await
        }
        Commands::Cat {
            output,
            suffix,
            template,
            sorted,
        } => run_cat_command(output, suffix, template, sorted, &config).await,
        Commands::Config => run_config_command(&config),
    }
}
