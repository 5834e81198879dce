//! # Relay decision engine
//!
//! Every inbound hop starts in `RECEIVED`, is validated, and then either
//! advances to the successor or terminates at the collector:
//!
//! ```text
//!              ┌── current < end ──▶ ADVANCE ───┐
//! RECEIVED ────┤                                ├──▶ FORWARDED (proxied response)
//!              └── current >= end ─▶ TERMINATE ─┘        or FAILED (RelayError)
//! ```
//!
//! Both branches make one blocking downstream call and hand the response to
//! the proxy, so a traversal is a nested chain of `end - current` calls with
//! the collector at the far end. The chain depth limit is enforced before any
//! call is made.

use crate::context::RelayContext;
use crate::error::{HopTarget, RelayError, Result};
use crate::proxy::proxy_response;
use hyper::{Body, Response};
use magnet_network::NodeIdentity;
use magnet_types::{decode_object, CompletionReport, HopMessage};
use tracing::debug;

/// Outcome of validating a hop message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopDecision {
    /// Forward `message` to the member at `next_ordinal`
    Advance {
        next_ordinal: u32,
        message: HopMessage,
    },
    /// Deliver `report` to the collector
    Terminate { report: CompletionReport },
}

impl HopDecision {
    pub fn target(&self) -> HopTarget {
        match self {
            HopDecision::Advance { next_ordinal, .. } => HopTarget::NextNode {
                ordinal: *next_ordinal,
            },
            HopDecision::Terminate { .. } => HopTarget::Collector,
        }
    }
}

/// Decode the hop message at the start of `body`; trailing bytes are ignored
pub fn decode_hop(body: &[u8]) -> Result<HopMessage> {
    decode_object(body).map_err(|err| RelayError::InvalidBody {
        reason: err.to_string(),
    })
}

/// Validate `message` and pick the transition
pub fn decide(
    identity: &NodeIdentity,
    message: HopMessage,
    max_chain_depth: u64,
) -> Result<HopDecision> {
    if message.end < 0 {
        return Err(RelayError::NegativeEnd { end: message.end });
    }

    let remaining = message.remaining_hops();
    if remaining > max_chain_depth {
        return Err(RelayError::ChainTooDeep {
            remaining,
            limit: max_chain_depth,
        });
    }

    if message.is_complete() {
        return Ok(HopDecision::Terminate {
            report: CompletionReport {
                end: message.end,
                current: message.current,
                origin_ordinal: identity.ordinal(),
                origin_name: identity.name(),
            },
        });
    }

    Ok(HopDecision::Advance {
        next_ordinal: identity.successor(),
        message: message.advance(),
    })
}

/// Handle one hop end to end and return the proxied downstream response
pub async fn relay_hop(context: &RelayContext, body: &[u8]) -> Result<Response<Body>> {
    let message = decode_hop(body)?;
    let decision = decide(context.identity(), message, context.max_chain_depth())?;
    let target = decision.target();

    let upstream = match &decision {
        HopDecision::Advance {
            next_ordinal,
            message,
        } => {
            let address = context.directory().hop_address(*next_ordinal);
            debug!(
                node = %context.identity(),
                next = next_ordinal,
                %address,
                end = message.end,
                current = message.current,
                "forwarding hop"
            );
            context.transport().post_json(&address, message).await
        }
        HopDecision::Terminate { report } => {
            let collector = context
                .collector_url()
                .ok_or(RelayError::CollectorUnconfigured)?;
            debug!(
                node = %context.identity(),
                collector = %collector,
                end = report.end,
                current = report.current,
                "traversal complete, reporting to collector"
            );
            context.transport().post_json(collector.as_str(), report).await
        }
    }
    .map_err(|err| RelayError::from_transport(target, err))?;

    debug!(downstream = %target, status = %upstream.status(), "proxying downstream response");
    Ok(proxy_response(upstream, target))
}
