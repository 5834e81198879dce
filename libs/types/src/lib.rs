//! # Magnet Wire Types
//!
//! Payloads shared between relay nodes and the experiment collector. Kept
//! free of transport concerns so both services (and tests) can depend on it
//! without pulling in an HTTP stack.

pub mod decode;
pub mod messages;

pub use decode::decode_object;

pub use messages::{
    CollectorAck, CompletionReport, HopMessage, LegacyCompletionReport, ObservedReport,
    ReportShape,
};
