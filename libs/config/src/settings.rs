//! Relay Settings
//!
//! Layering, lowest precedence first:
//! 1. built-in defaults ([`RelaySettings::default`])
//! 2. an optional config file (TOML/JSON/YAML, format picked by extension)
//! 3. command line flags and their environment variables, applied by the binary
//!
//! [`RelaySettings::validate`] turns the raw layers into [`RingSettings`]; it is
//! the only place ring parameters are checked.

use crate::error::{ConfigError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_BASE_NAME: &str = "magnet";
pub const DEFAULT_SERVICE_DOMAIN: &str = "magnets";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_MEMBER_PORT: u16 = 8080;
pub const DEFAULT_HOP_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_LAPS: u32 = 8;

/// Unvalidated relay settings as read from file, flags and environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Number of members in the ring (required)
    pub ring_size: Option<i64>,
    /// StatefulSet name shared by all members
    pub base_name: String,
    /// Headless service the members are published under
    pub service_domain: String,
    /// Port every member listens on
    pub member_port: u16,
    /// Collector endpoint, e.g. `http://experiment-cake:8080/observe`
    pub experiment_url: Option<String>,
    /// Local listen address; `:8080` is shorthand for all interfaces
    pub listen: String,
    /// Assigned node name; the host name is used when unset
    pub node_name: Option<String>,
    /// Bound on each downstream call
    pub hop_timeout_ms: u64,
    /// Chain depth limit, in full trips around the ring
    pub max_laps: u32,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            ring_size: None,
            base_name: DEFAULT_BASE_NAME.to_string(),
            service_domain: DEFAULT_SERVICE_DOMAIN.to_string(),
            member_port: DEFAULT_MEMBER_PORT,
            experiment_url: None,
            listen: DEFAULT_LISTEN.to_string(),
            node_name: None,
            hop_timeout_ms: DEFAULT_HOP_TIMEOUT_MS,
            max_laps: DEFAULT_MAX_LAPS,
        }
    }
}

/// Validated settings a relay node runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSettings {
    pub ring_size: u32,
    pub base_name: String,
    pub service_domain: String,
    pub member_port: u16,
    pub collector_url: Option<Url>,
    pub listen: SocketAddr,
    pub node_name: Option<String>,
    pub hop_timeout: Duration,
    pub max_laps: u32,
}

impl RelaySettings {
    /// Defaults, overlaid with `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        info!("Loading relay config: {:?}", path);
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<RingSettings> {
        let ring_size = match self.ring_size {
            None => return Err(ConfigError::MissingRingSize),
            Some(value) => u32::try_from(value)
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidRingSize { value })?,
        };

        require_non_empty("base_name", &self.base_name)?;
        require_non_empty("service_domain", &self.service_domain)?;

        if self.member_port == 0 {
            return Err(ConfigError::Invalid {
                field: "member_port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.hop_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "hop_timeout_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.max_laps == 0 {
            return Err(ConfigError::Invalid {
                field: "max_laps",
                reason: "must be at least 1".to_string(),
            });
        }

        let collector_url = match self.experiment_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_collector_url(raw)?),
        };

        let node_name = self
            .node_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(RingSettings {
            ring_size,
            base_name: self.base_name.clone(),
            service_domain: self.service_domain.clone(),
            member_port: self.member_port,
            collector_url,
            listen: parse_listen_addr(&self.listen)?,
            node_name,
            hop_timeout: Duration::from_millis(self.hop_timeout_ms),
            max_laps: self.max_laps,
        })
    }
}

/// Parse a listen address, accepting the `:port` shorthand
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr> {
    let raw = raw.trim();
    let expanded = if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    };

    expanded
        .parse()
        .map_err(|source| ConfigError::InvalidListen {
            value: raw.to_string(),
            source,
        })
}

fn parse_collector_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidCollectorUrl {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidCollectorUrl {
            value: raw.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
