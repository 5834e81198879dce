//! Relay context
//!
//! Everything a hop handler needs, built once at startup and shared read-only
//! (behind an `Arc`) by every request task. There is no other shared state.

use magnet_config::RingSettings;
use magnet_network::{
    DiscoveryError, HeadlessServiceDirectory, HopTransport, IdentityProvider, NodeIdentity,
    RingDirectory, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failures building the context; the node must not start
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("identity resolution failed: {0}")]
    Identity(#[from] DiscoveryError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone)]
pub struct RelayContext {
    identity: NodeIdentity,
    directory: Arc<dyn RingDirectory>,
    collector_url: Option<Url>,
    transport: HopTransport,
    max_chain_depth: u64,
}

impl RelayContext {
    /// Context with no collector and a one-lap chain limit
    pub fn new(
        identity: NodeIdentity,
        directory: Arc<dyn RingDirectory>,
        transport: HopTransport,
    ) -> Self {
        let max_chain_depth = u64::from(identity.ring_size());
        Self {
            identity,
            directory,
            collector_url: None,
            transport,
            max_chain_depth,
        }
    }

    /// Production context: headless-service addressing, identity from `provider`
    pub fn from_settings(
        settings: &RingSettings,
        provider: &dyn IdentityProvider,
    ) -> Result<Self, StartupError> {
        let identity = NodeIdentity::resolve(
            provider,
            settings.ring_size,
            settings.base_name.clone(),
            settings.service_domain.clone(),
        )?;
        let directory = HeadlessServiceDirectory::for_identity(&identity, settings.member_port);
        let transport = HopTransport::new(settings.hop_timeout)?;

        Ok(Self::new(identity, Arc::new(directory), transport)
            .with_collector(settings.collector_url.clone())
            .with_max_laps(settings.max_laps))
    }

    pub fn with_collector(mut self, collector_url: Option<Url>) -> Self {
        self.collector_url = collector_url;
        self
    }

    /// Limit chain depth to `laps` full trips around the ring
    pub fn with_max_laps(mut self, laps: u32) -> Self {
        self.max_chain_depth = u64::from(self.identity.ring_size()) * u64::from(laps);
        self
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn directory(&self) -> &dyn RingDirectory {
        self.directory.as_ref()
    }

    pub fn collector_url(&self) -> Option<&Url> {
        self.collector_url.as_ref()
    }

    pub fn transport(&self) -> &HopTransport {
        &self.transport
    }

    pub fn hop_timeout(&self) -> Duration {
        self.transport.timeout()
    }

    pub fn max_chain_depth(&self) -> u64 {
        self.max_chain_depth
    }
}
