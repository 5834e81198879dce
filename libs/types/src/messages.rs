//! Wire messages exchanged along the ring
//!
//! Three payloads travel over HTTP as JSON:
//! - [`HopMessage`]: node → next node, body of `POST /hop`
//! - [`CompletionReport`]: terminating node → collector, body of `POST /observe`
//! - [`CollectorAck`]: collector → terminating node, proxied back to the caller
//!
//! Field names follow the collector's established schema (`magnet_id`,
//! `magnet_name`, `experiment`) so existing collectors keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of a single traversal through the ring
///
/// Missing fields decode as zero and unknown fields are ignored, matching what
/// existing callers already send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopMessage {
    /// Target count at which the traversal terminates
    #[serde(default)]
    pub end: i64,
    /// Number of hops taken so far
    #[serde(default)]
    pub current: i64,
}

impl HopMessage {
    pub fn new(end: i64, current: i64) -> Self {
        Self { end, current }
    }

    /// True once the counter has reached its target
    pub fn is_complete(&self) -> bool {
        self.current >= self.end
    }

    /// Forwarding hops still needed before the collector is reached
    pub fn remaining_hops(&self) -> u64 {
        let remaining = i128::from(self.end) - i128::from(self.current);
        remaining.clamp(0, i128::from(u64::MAX)) as u64
    }

    /// Message handed to the successor
    ///
    /// Only meaningful while `!is_complete()`, which also rules out overflow.
    pub fn advance(&self) -> Self {
        Self {
            end: self.end,
            current: self.current + 1,
        }
    }
}

/// Final report delivered to the collector by the node that observes
/// `current >= end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub end: i64,
    pub current: i64,
    /// Ordinal of the reporting node
    #[serde(rename = "magnet_id")]
    pub origin_ordinal: u32,
    /// Derived name of the reporting node, e.g. `magnet-2`
    #[serde(rename = "magnet_name")]
    pub origin_name: String,
}

/// Older report shape without `end` and `magnet_id`
///
/// Relay nodes never emit it; collectors still accept it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCompletionReport {
    pub current: i64,
    #[serde(rename = "magnet_name")]
    pub origin_name: String,
}

/// Which of the two report shapes a collector received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportShape {
    Rich,
    Legacy,
}

/// Collector-side view of an incoming report, accepting both shapes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default)]
    pub current: i64,
    #[serde(
        rename = "magnet_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_ordinal: Option<u32>,
    #[serde(rename = "magnet_name", default)]
    pub origin_name: String,
}

impl ObservedReport {
    pub fn shape(&self) -> ReportShape {
        if self.end.is_some() || self.origin_ordinal.is_some() {
            ReportShape::Rich
        } else {
            ReportShape::Legacy
        }
    }
}

impl From<CompletionReport> for ObservedReport {
    fn from(report: CompletionReport) -> Self {
        Self {
            end: Some(report.end),
            current: report.current,
            origin_ordinal: Some(report.origin_ordinal),
            origin_name: report.origin_name,
        }
    }
}

impl From<LegacyCompletionReport> for ObservedReport {
    fn from(report: LegacyCompletionReport) -> Self {
        Self {
            end: None,
            current: report.current,
            origin_ordinal: None,
            origin_name: report.origin_name,
        }
    }
}

/// Collector acknowledgment, relayed verbatim back to the original caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorAck {
    #[serde(rename = "experiment")]
    pub experiment_label: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    pub current: i64,
    #[serde(
        rename = "magnet_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_ordinal: Option<u32>,
    #[serde(rename = "magnet_name")]
    pub origin_name: String,
    pub message: String,
}
