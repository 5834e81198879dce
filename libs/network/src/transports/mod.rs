//! Outbound transports
//!
//! Relay nodes make exactly one kind of outbound call: an HTTP `POST` with a
//! JSON body to either the next ring member or the collector.

pub mod http;


pub use http::{HopTransport, DEFAULT_HOP_TIMEOUT};
