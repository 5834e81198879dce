//! Experiment collector entry point

use anyhow::{Context, Result};
use cake_collector::{CollectorServer, DEFAULT_EXPERIMENT};
use clap::Parser;
use magnet_config::parse_listen_addr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "experiment-cake", author, version, about = "Collects completion reports from a magnet ring", long_about = None)]
struct Args {
    /// Listen address (`:8080` listens on all interfaces)
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Label echoed in every acknowledgment
    #[arg(long, env = "EXPERIMENT_NAME", default_value = DEFAULT_EXPERIMENT)]
    experiment: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Err(e) = run(args).await {
        error!("collector failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let addr = parse_listen_addr(&args.listen).context("invalid listen address")?;
    info!("starting experiment {} on {}", args.experiment, addr);

    CollectorServer::new(args.experiment)
        .run(addr, shutdown_signal())
        .await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "experiment_cake=info,cake_collector=info,warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
