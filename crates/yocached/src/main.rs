//! `yocached` — a peer-addressable cache node.
//!
//! Binary entrypoint wiring the cache core to its HTTP peer transport:
//! groups come from the TOML config, values come from files under the
//! data directory, and misses for keys owned by other nodes are fetched
//! from them over HTTP.
//!
//! # Usage
//!
//! ```text
//! yocached start                                 # single node, defaults
//! yocached start -c yocached.toml                # with a config file
//! yocached start --listen 127.0.0.1:4891 \
//!     --self-url http://127.0.0.1:4891 \
//!     --peer http://127.0.0.1:4890 \
//!     --peer http://127.0.0.1:4891               # second cluster node
//! ```

mod config;
mod loader;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use yocache::{GroupConfig, PeerPicker, Registry};
use yocache_http::{HttpPool, HttpPoolConfig};

use config::CliConfig;
use loader::FileLoader;

#[derive(Parser)]
#[command(name = "yocached", version, about = "Distributed read-through cache node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the cache node.
    Start {
        /// Path to a TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address for the peer endpoint (overrides config).
        #[arg(short, long)]
        listen: Option<String>,

        /// Base URL other nodes reach this one at (overrides config).
        #[arg(long)]
        self_url: Option<String>,

        /// Peer base URL, this node included (repeatable; overrides config).
        #[arg(long = "peer")]
        peers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start {
            config,
            listen,
            self_url,
            peers,
        } => start(config, listen, self_url, peers).await,
    }
}

async fn start(
    config_path: Option<PathBuf>,
    listen: Option<String>,
    self_url: Option<String>,
    peers: Vec<String>,
) -> Result<()> {
    let mut config = CliConfig::load(config_path.as_deref()).context("loading config")?;
    if let Some(listen) = listen {
        config.node.listen_addr = listen;
    }
    if let Some(self_url) = self_url {
        config.node.self_url = Some(self_url);
    }
    if !peers.is_empty() {
        config.cluster.peers = peers;
    }

    telemetry::init(&config.log.level);

    let self_url = config.self_url();
    let registry = Registry::new();
    let mut group_names = Vec::new();

    for section in config.effective_groups() {
        let data_dir = config.node.data_dir.join(&section.name);
        let group_config = GroupConfig {
            name: section.name.clone(),
            cache_bytes: section.cache_bytes()?,
            ttl: section.ttl()?,
            peer_fallback: section.peer_fallback,
        };
        registry.new_group(group_config, Arc::new(FileLoader::new(&data_dir)));
        group_names.push(section.name);
    }

    let pool = HttpPool::new(
        self_url.clone(),
        registry.clone(),
        HttpPoolConfig {
            base_path: config.http.base_path.clone(),
            replicas: config.http.replicas,
            hash: None,
            codec: config.codec()?,
        },
    );

    if !config.cluster.peers.is_empty() {
        pool.set_peers(&config.cluster.peers);
    }

    let picker: Arc<dyn PeerPicker> = Arc::new(pool.clone());
    for name in &group_names {
        registry
            .get_group(name)
            .expect("group registered above")
            .register_peer_picker(picker.clone());
    }

    info!(
        %self_url,
        listen = %config.node.listen_addr,
        groups = group_names.len(),
        peers = config.cluster.peers.len(),
        "starting cache node"
    );

    pool.serve_with_shutdown(&config.node.listen_addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await
    .context("serving peer endpoint")?;

    Ok(())
}
