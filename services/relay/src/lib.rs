//! # Magnet Relay Node
//!
//! A relay node is one member of a fixed-size ring. It receives a counter on
//! `POST /hop`, and either forwards it (incremented) to its successor or, once
//! the target is reached, reports to the experiment collector. Whatever comes
//! back downstream is streamed back to the caller unchanged, so the
//! collector's reply unwinds through every hop to whoever started the
//! traversal.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use magnet_network::{FixedOrdinal, HeadlessServiceDirectory, HopTransport, NodeIdentity};
//! use magnet_relay::{RelayContext, RelayServer};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let identity = NodeIdentity::resolve(&FixedOrdinal(0), 4, "magnet", "magnets")?;
//! let directory = HeadlessServiceDirectory::for_identity(&identity, 8080);
//! let transport = HopTransport::new(magnet_network::DEFAULT_HOP_TIMEOUT)?;
//! let context = RelayContext::new(identity, Arc::new(directory), transport);
//!
//! RelayServer::new(context)
//!     .run("0.0.0.0:8080".parse()?, std::future::pending())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod proxy;
pub mod server;

pub use context::{RelayContext, StartupError};
pub use engine::{decide, decode_hop, relay_hop, HopDecision};
pub use error::{HopTarget, RelayError, Result};
pub use server::RelayServer;
