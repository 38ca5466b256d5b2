//! # Relay Node
//!
//! Runs one role of the relay rig and takes `start` / `stop` / `exit`
//! commands from stdin. EOF on stdin behaves like `exit`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relay_node::telemetry::init_logging;
use relay_node::{Command, EchoNode, InitiatorNode, NodeConfig, ProxyNode, RoleService};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Role {
    Initiator,
    Echo,
    Proxy,
}

/// Relay rig node: Initiator, Echo or Proxy.
#[derive(Parser, Debug)]
#[command(name = "relay-node", version)]
#[command(about = "Run one role of the Initiator -> Proxy -> Echo relay rig")]
struct Args {
    /// Role to run
    #[arg(value_enum)]
    role: Role,

    /// Proxy host (listen address for the Proxy)
    #[arg(long)]
    host: Option<String>,

    /// Proxy port
    #[arg(long)]
    port: Option<u16>,

    /// Connections opened by an Initiator or Echo node
    #[arg(long)]
    connections: Option<usize>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for output files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Start immediately instead of waiting for `start`
    #[arg(long)]
    autostart: bool,
}

/// Defaults, then the config file, then the environment, then arguments.
fn load_config(args: &Args) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    config.apply_env()?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(connections) = args.connections {
        config.connections = connections;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn build_node(role: Role, config: NodeConfig) -> Result<Box<dyn RoleService>> {
    let node: Box<dyn RoleService> = match role {
        Role::Initiator => Box::new(InitiatorNode::new(config)?),
        Role::Echo => Box::new(EchoNode::new(config)?),
        Role::Proxy => Box::new(ProxyNode::bind(config).await?),
    };
    Ok(node)
}

fn start(node: &dyn RoleService, root: &CancellationToken) {
    match node.start(root) {
        Ok(()) => println!("{} started", node.role()),
        Err(e) => println!("Cannot start {}: {e}", node.role()),
    }
}

async fn stop(node: &dyn RoleService) {
    match node.stop().await {
        Ok(()) => println!("{} stopped", node.role()),
        Err(e) => {
            warn!(role = %node.role(), error = %e, "Stop did not complete");
            println!("{} did not stop cleanly: {e}", node.role());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging().context("failed to initialise logging")?;

    let config = load_config(&args).context("invalid configuration")?;
    info!(
        role = ?args.role,
        addr = %config.proxy_addr(),
        connections = config.connections,
        "Loaded configuration"
    );

    let node = build_node(args.role, config).await.context("failed to create node")?;
    let root = CancellationToken::new();

    println!("Relay node: {}", node.role());
    println!("Commands: {}", Command::ACCEPTED);
    if args.autostart {
        start(node.as_ref(), &root);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            stop(node.as_ref()).await;
            break;
        };

        match Command::parse(&line) {
            Command::Start => start(node.as_ref(), &root),
            Command::Stop => stop(node.as_ref()).await,
            Command::Exit => {
                stop(node.as_ref()).await;
                break;
            }
            Command::Unknown(word) => {
                println!("Unknown command {word:?}. Commands: {}", Command::ACCEPTED);
            }
        }
    }

    root.cancel();
    Ok(())
}
