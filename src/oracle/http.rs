//! HTTP Bridge Simulator
//!
//! POSTs a `SimulateRequest` as JSON to the bridge service's simulate endpoint
//! and decodes the `SimulateResponse`.

use eyre::{eyre, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

use super::{BridgeSimulator, SimulateRequest, SimulateResponse};

/// Default timeout for a single simulate call
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct HttpBridgeSimulator {
    http_client: Client,
    simulate_url: String,
}

impl HttpBridgeSimulator {
    /// Create a client for `simulate_url` with a per-request timeout
    pub fn new(simulate_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            simulate_url: simulate_url.into(),
        })
    }

    pub fn simulate_url(&self) -> &str {
        &self.simulate_url
    }
}

impl BridgeSimulator for HttpBridgeSimulator {
    async fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse> {
        trace!(
            "Simulating {} {} → chain {} from [{:?}]",
            request.amount,
            request.token,
            request.chain_id,
            request.source_chains
        );

        let response = self
            .http_client
            .post(&self.simulate_url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("Simulate request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            // The bridge puts its reason ("Insufficient balance", "InternalRpcError", ...)
            // in the body, keep it for classification
            let body = response.text().await.unwrap_or_default();
            return Err(eyre!("Simulation failed ({}): {}", status, body));
        }

        let decoded: SimulateResponse = response
            .json()
            .await
            .map_err(|e| transport_error("Failed to decode simulate response", e))?;

        debug!(
            "Simulated {} {}: success={}, sourcesTotal={:?}",
            request.amount,
            request.token,
            decoded.success,
            decoded.sources_total()
        );

        Ok(decoded)
    }
}

/// Timeouts keep the `TIMED_OUT` marker the failure classifier looks for
fn transport_error(context: &str, e: reqwest::Error) -> eyre::Report {
    if e.is_timeout() {
        eyre!("TIMED_OUT: {}", e)
    } else {
        eyre!("{}: {}", context, e)
    }
}
