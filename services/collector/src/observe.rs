//! Observation handling: decode a completion report and build the ack

use chrono::{DateTime, Utc};
use magnet_types::{decode_object, CollectorAck, ObservedReport, ReportShape};
use thiserror::Error;

/// Message sent back for reports carrying `end` and `magnet_id`
pub const COLLIDED_MESSAGE: &str = "All kubrons successfully collided 🎂";

#[derive(Error, Debug)]
pub enum ObserveError {
    #[error("invalid JSON body")]
    InvalidBody { reason: String },
}

/// Decode the report at the start of `body`, in either shape
pub fn decode_report(body: &[u8]) -> Result<ObservedReport, ObserveError> {
    decode_object(body).map_err(|err| ObserveError::InvalidBody {
        reason: err.to_string(),
    })
}

/// Acknowledgment for `report`, stamped at `timestamp`
pub fn acknowledge(
    experiment: &str,
    report: ObservedReport,
    timestamp: DateTime<Utc>,
) -> CollectorAck {
    let message = match report.shape() {
        ReportShape::Rich => COLLIDED_MESSAGE.to_string(),
        ReportShape::Legacy => format!("Kubron of size {} observed 🎂", report.current),
    };

    CollectorAck {
        experiment_label: experiment.to_string(),
        timestamp,
        end: report.end,
        current: report.current,
        origin_ordinal: report.origin_ordinal,
        origin_name: report.origin_name,
        message,
    }
}
