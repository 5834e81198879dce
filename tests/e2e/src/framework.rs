//! Ring harness

use anyhow::{Context, Result};
use cake_collector::CollectorServer;
use magnet_network::{FixedOrdinal, HopTransport, NodeIdentity, StaticDirectory};
use magnet_relay::{RelayContext, RelayServer};
use std::collections::BTreeSet;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;
use url::Url;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process; `RUST_LOG` controls output
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub struct RingHarnessBuilder {
    ring_size: u32,
    base_name: String,
    experiment: String,
    hop_timeout: Duration,
    max_laps: u32,
    missing: BTreeSet<u32>,
}

impl RingHarnessBuilder {
    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }

    pub fn experiment(mut self, label: impl Into<String>) -> Self {
        self.experiment = label.into();
        self
    }

    pub fn hop_timeout(mut self, timeout: Duration) -> Self {
        self.hop_timeout = timeout;
        self
    }

    pub fn max_laps(mut self, laps: u32) -> Self {
        self.max_laps = laps;
        self
    }

    /// Leave `ordinal` unstarted; its address refuses connections
    pub fn without_node(mut self, ordinal: u32) -> Self {
        self.missing.insert(ordinal);
        self
    }

    pub async fn start(self) -> Result<RingHarness> {
        init_test_tracing();

        let collector_listener = bind_loopback()?;
        let collector_addr = collector_listener.local_addr()?;
        let collector_url = Url::parse(&format!("http://{}/observe", collector_addr))
            .context("collector URL")?;

        let mut listeners = Vec::with_capacity(self.ring_size as usize);
        for _ in 0..self.ring_size {
            listeners.push(bind_loopback()?);
        }
        let node_addrs = listeners
            .iter()
            .map(|listener| listener.local_addr())
            .collect::<std::io::Result<Vec<SocketAddr>>>()?;

        let directory = Arc::new(StaticDirectory::new(
            node_addrs
                .iter()
                .map(|addr| format!("http://{}/hop", addr))
                .collect(),
        )?);

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(
            CollectorServer::new(self.experiment.clone())
                .serve(collector_listener, std::future::pending()),
        ));

        for (ordinal, listener) in (0u32..).zip(listeners) {
            if self.missing.contains(&ordinal) {
                // dropping the listener frees the port, leaving a dead member
                continue;
            }
            let identity = NodeIdentity::resolve(
                &FixedOrdinal(ordinal),
                self.ring_size,
                &self.base_name,
                "magnets",
            )?;
            let context = RelayContext::new(
                identity,
                directory.clone(),
                HopTransport::new(self.hop_timeout)?,
            )
            .with_collector(Some(collector_url.clone()))
            .with_max_laps(self.max_laps);

            tasks.push(tokio::spawn(
                RelayServer::new(context).serve(listener, std::future::pending()),
            ));
        }

        info!(
            ring_size = self.ring_size,
            missing = ?self.missing,
            "ring harness started"
        );

        Ok(RingHarness {
            node_addrs,
            collector_addr,
            client: reqwest::Client::new(),
            tasks,
        })
    }
}

/// A running in-process ring; servers stop when it is dropped
pub struct RingHarness {
    node_addrs: Vec<SocketAddr>,
    collector_addr: SocketAddr,
    client: reqwest::Client,
    tasks: Vec<JoinHandle<Result<()>>>,
}

impl RingHarness {
    pub fn builder(ring_size: u32) -> RingHarnessBuilder {
        RingHarnessBuilder {
            ring_size,
            base_name: "magnet".to_string(),
            experiment: "CAKE".to_string(),
            hop_timeout: Duration::from_secs(5),
            max_laps: 8,
            missing: BTreeSet::new(),
        }
    }

    pub fn ring_size(&self) -> usize {
        self.node_addrs.len()
    }

    pub fn hop_url(&self, ordinal: u32) -> String {
        format!("http://{}/hop", self.node_addrs[ordinal as usize])
    }

    pub fn collector_url(&self) -> String {
        format!("http://{}/observe", self.collector_addr)
    }

    /// Start a traversal at `ordinal`
    pub async fn send_hop(&self, ordinal: u32, body: &str) -> Result<reqwest::Response> {
        self.client
            .post(self.hop_url(ordinal))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .with_context(|| format!("POST /hop to node {}", ordinal))
    }
}

impl Drop for RingHarness {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn bind_loopback() -> Result<TcpListener> {
    TcpListener::bind("127.0.0.1:0").context("bind loopback listener")
}
