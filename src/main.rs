use anyhow::Context;
use clap::Parser;
use shardtext::cli::{execute_command, init_logging, Cli};
use shardtext::config::ConfigLoader;
use shardtext::error::ShardError;
use tracing::{debug, error, trace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        let exit_code = match e.downcast_ref::<ShardError>() {
            Some(shard_error) => {
                eprintln!("Error: {}", shard_error.user_message());
                shard_error.exit_code()
            }
            None => {
                eprintln!("Error: {e:#}");
                1
            }
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_file(cli.config.clone())
        .load()
        .await
        .context("Failed to load configuration")?;

    init_logging(cli.verbose, &config.log_level);

    debug!("shardtext started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    execute_command(cli.command, config).await
}
