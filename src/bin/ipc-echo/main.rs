use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ipc_echo::{EchoConfig, EchoServer};

mod cli;
mod error;
mod replay;

use cli::{Cli, Commands};
use error::{CliResult, to_exit_code};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = if cli.verbose {
        "ipc_echo=debug"
    } else {
        "ipc_echo=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    to_exit_code(run(cli))
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => EchoConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EchoConfig::default(),
    };

    match cli.command {
        Commands::Replay(args) => replay::execute(args, config),
        Commands::ShowConfig => {
            show_config(config);
            Ok(())
        }
    }
}

fn show_config(config: EchoConfig) {
    let server = EchoServer::with_config(config);
    println!("{:<16} {:>8} {:>10}", "pool", "blocks", "block size");
    for stats in server.pool_stats() {
        println!(
            "{:<16} {:>8} {:>10}",
            stats.name, stats.capacity, stats.block_size
        );
    }
}
