//! # MedChain Node
//!
//! ```text
//! mc-node run --port 8001 --peer 127.0.0.1:8002 --peer 127.0.0.1:8003
//! mc-node keygen --port 8001
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mc_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::control::{run_stdin, ControlShell};
use node_runtime::{NodeConfig, NodeRuntime};
use shared_crypto::{AuthorityKeys, FileKeyStore};
use shared_types::ValidatorId;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mc-node")]
#[command(about = "MedChain proof-of-authority ledger node", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a node
    Run(RunArgs),

    /// Generate the key pair of a validator
    Keygen {
        /// Validator port
        #[arg(short, long)]
        port: u16,

        /// Directory to write the key files to
        #[arg(long, default_value = "keys")]
        keys_dir: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port, also the validator identity
    #[arg(short, long)]
    port: Option<u16>,

    /// Peer to dial at startup, as host:port (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Directory holding the ledger file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding validator keys
    #[arg(long)]
    keys_dir: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> Result<NodeConfig> {
        let mut config =
            NodeConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if !self.peers.is_empty() {
            config.network.bootstrap_peers = self.peers;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
        if let Some(dir) = self.keys_dir {
            config.keys.keys_dir = dir;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.into_config()?;
    let _telemetry = init_telemetry(TelemetryConfig::for_node(config.network.port))
        .context("Failed to initialize telemetry")?;

    let keys: Arc<dyn AuthorityKeys> = Arc::new(FileKeyStore::new(&config.keys.keys_dir));
    let node = NodeRuntime::start(config, keys)
        .await
        .context("Node startup failed")?;

    let shell = ControlShell::new(&node);
    info!("Node is running. Type HELP for commands, Ctrl+C to stop.");

    tokio::select! {
        result = run_stdin(shell) => {
            if let Err(e) = result {
                error!(error = %e, "Console input failed");
            }
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
        }
    }

    node.shutdown();
    Ok(())
}

fn keygen(port: u16, keys_dir: PathBuf) -> Result<()> {
    let store = FileKeyStore::new(&keys_dir);
    let validator = ValidatorId(port);
    let public = store
        .generate(validator)
        .with_context(|| format!("Failed to generate keys for validator {validator}"))?;
    println!("Wrote {}", store.private_key_path(validator).display());
    println!("Wrote {}", store.public_key_path(validator).display());
    println!("Public key: {}", public.to_hex());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Keygen { port, keys_dir } => keygen(port, keys_dir),
    }
}
