#![forbid(unsafe_code)]
//! Proofchain node: a single-node proof-of-work ledger served over HTTP

use clap::Parser;
use proofchain::config::{load_config_from, DEFAULT_CONFIG_PATH};
use proofchain::node::Node;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "proofchain-node", version, about = "Run a Proofchain ledger node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override network.api_port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config_from(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = args.port {
        config.network.api_port = port;
        if let Err(e) = config.validate() {
            eprintln!("Invalid --port: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let node = match Node::init(config) {
        Ok(node) => Arc::new(node),
        Err(e) => {
            eprintln!("Failed to initialize node: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = node.start().await {
        tracing::error!("Node stopped: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
