use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipc-echo")]
#[command(version)]
#[command(about = "Replay echo requests through the deferred dispatch core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (TOML)
    #[arg(short, long, global = true, env = "IPC_ECHO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a script of requests and print every response as a JSON line
    Replay(ReplayArgs),

    /// Print the effective pool layout
    ShowConfig,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON array of requests (MessagePack if the file ends in .msgpack)
    pub script: PathBuf,

    /// Requests submitted before each drain of the deferred queue
    #[arg(short, long, default_value_t = 1)]
    pub batch: usize,

    /// Register logging handlers on both notification channels
    #[arg(short, long)]
    pub subscribe: bool,
}
