//! # CAKE Collector
//!
//! Terminal endpoint of a magnet ring. The node that finishes a traversal
//! posts its completion report to `POST /observe`; the acknowledgment it gets
//! back travels unchanged through every hop to the original caller.
//!
//! Both report shapes are accepted. Reports carrying `end` and `magnet_id`
//! get the collision message; the older `{current, magnet_name}` shape gets a
//! size message instead.

pub mod observe;
pub mod server;

pub use observe::{acknowledge, decode_report, ObserveError, COLLIDED_MESSAGE};
pub use server::{CollectorServer, DEFAULT_EXPERIMENT, HEALTH_PATH, OBSERVE_PATH};
