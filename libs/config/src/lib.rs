//! # Magnet Configuration
//!
//! Startup configuration for relay nodes. Misconfiguration found here is
//! fatal: a node with an unknown ring size must never accept traffic.

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{parse_listen_addr, RelaySettings, RingSettings};
