//! Bridge Oracle
//!
//! The quote engine's only external capability: ask the bridge to simulate
//! delivering an amount and report what the sources would have to pay.
//!
//! - `BridgeSimulator`: the seam the engine is generic over
//! - `HttpBridgeSimulator`: JSON-over-HTTP implementation

mod http;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use http::{HttpBridgeSimulator, DEFAULT_TIMEOUT_SECS};
pub use types::{SimulateRequest, SimulateResponse, SimulatedIntent};

use eyre::Result;
use std::future::Future;

/// Simulates a bridge intent for a candidate receive amount.
///
/// Errors carry the bridge's message text; the engine classifies them by
/// substring ("Insufficient", "InternalRpcError", "TIMED_OUT", ...).
pub trait BridgeSimulator: Send + Sync {
    fn simulate(
        &self,
        request: &SimulateRequest,
    ) -> impl Future<Output = Result<SimulateResponse>> + Send;
}
