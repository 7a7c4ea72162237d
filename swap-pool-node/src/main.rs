//! Swap Pool Node
//!
//! Main entry point: loads configuration and serves the pool API.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use swap_pool_node::{node, NodeConfig};
use tracing_subscriber::EnvFilter;

/// Social swap pool governance node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SWAP_POOL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path).await?,
        None => {
            let mut config = NodeConfig::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    config.check()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    node::run(config).await
}
