//! Magnet relay node entry point

use anyhow::{Context, Result};
use clap::Parser;
use magnet_config::RelaySettings;
use magnet_network::AssignedName;
use magnet_relay::{RelayContext, RelayServer};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "magnet", author, version, about = "Hot-potato relay node for a StatefulSet ring", long_about = None)]
struct Args {
    /// Configuration file path (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of members in the ring
    #[arg(long, env = "RING_SIZE", allow_negative_numbers = true)]
    ring_size: Option<i64>,

    /// StatefulSet name shared by all members
    #[arg(long, env = "RING_BASENAME")]
    base_name: Option<String>,

    /// Headless service the members are published under
    #[arg(long, env = "RING_SERVICE")]
    service_domain: Option<String>,

    /// Port every member listens on
    #[arg(long, env = "RING_PORT")]
    member_port: Option<u16>,

    /// Collector endpoint, e.g. http://experiment-cake:8080/observe
    #[arg(long, env = "EXPERIMENT_URL")]
    experiment_url: Option<String>,

    /// Listen address (`:8080` listens on all interfaces)
    #[arg(long, env = "HTTP_ADDR")]
    listen: Option<String>,

    /// Assigned node name, defaults to the host name
    #[arg(long, env = "POD_NAME")]
    node_name: Option<String>,

    /// Timeout for each downstream call, in milliseconds
    #[arg(long, env = "HOP_TIMEOUT_MS")]
    hop_timeout_ms: Option<u64>,

    /// Longest accepted traversal, in full trips around the ring
    #[arg(long, env = "RING_MAX_LAPS")]
    max_laps: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Flags and environment take precedence over the config file
    fn apply(self, settings: &mut RelaySettings) {
        if let Some(ring_size) = self.ring_size {
            settings.ring_size = Some(ring_size);
        }
        if let Some(base_name) = self.base_name {
            settings.base_name = base_name;
        }
        if let Some(service_domain) = self.service_domain {
            settings.service_domain = service_domain;
        }
        if let Some(member_port) = self.member_port {
            settings.member_port = member_port;
        }
        if let Some(experiment_url) = self.experiment_url {
            settings.experiment_url = Some(experiment_url);
        }
        if let Some(listen) = self.listen {
            settings.listen = listen;
        }
        if let Some(node_name) = self.node_name {
            settings.node_name = Some(node_name);
        }
        if let Some(hop_timeout_ms) = self.hop_timeout_ms {
            settings.hop_timeout_ms = hop_timeout_ms;
        }
        if let Some(max_laps) = self.max_laps {
            settings.max_laps = max_laps;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Err(e) = run(args).await {
        error!("magnet failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut settings =
        RelaySettings::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut settings);
    let ring = settings
        .validate()
        .context("invalid relay configuration")?;

    let provider = match &ring.node_name {
        Some(name) => AssignedName::new(name.clone()),
        None => AssignedName::from_hostname().context("cannot determine node name")?,
    };
    let context = RelayContext::from_settings(&ring, &provider)
        .with_context(|| format!("cannot resolve ring identity from {:?}", provider.name()))?;

    info!(
        "{} starting, ring_size={}, experiment_url={:?}, hop_timeout={:?}, max_chain_depth={}",
        context.identity().name(),
        ring.ring_size,
        ring.collector_url.as_ref().map(|url| url.as_str()),
        context.hop_timeout(),
        context.max_chain_depth()
    );

    RelayServer::new(context)
        .run(ring.listen, shutdown_signal())
        .await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "magnet=info,magnet_relay=info,magnet_network=info,warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
