//! Wire types for the bridge simulation API

use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};

use crate::quote::SourceRecord;

/// Simulate delivering `amount` of `token` on `chain_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    /// Token symbol
    pub token: String,

    /// Candidate receive amount, decimal string
    pub amount: String,

    /// Destination chain
    pub chain_id: ChainId,

    /// Chains the bridge may pull funds from
    pub source_chains: Vec<ChainId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub success: bool,

    #[serde(default)]
    pub intent: Option<SimulatedIntent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedIntent {
    /// Total the sources must pay for the requested receive amount
    #[serde(default)]
    pub sources_total: Option<String>,

    #[serde(default)]
    pub all_sources: Option<Vec<SourceRecord>>,
}

impl SimulateResponse {
    /// Successful response carrying a sources total
    pub fn with_total(sources_total: impl Into<String>, sources: Vec<SourceRecord>) -> Self {
        Self {
            success: true,
            intent: Some(SimulatedIntent {
                sources_total: Some(sources_total.into()),
                all_sources: Some(sources),
            }),
        }
    }

    pub fn sources_total(&self) -> Option<&str> {
        self.intent.as_ref()?.sources_total.as_deref()
    }

    /// Reported sources, empty if the bridge sent none
    pub fn sources(&self) -> Vec<SourceRecord> {
        self.intent
            .as_ref()
            .and_then(|intent| intent.all_sources.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_sdk_field_names() {
        let request = SimulateRequest {
            token: "USDC".to_string(),
            amount: "0.5".to_string(),
            chain_id: 8453,
            source_chains: vec![42161],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chainId"], 8453);
        assert_eq!(json["sourceChains"][0], 42161);
        assert_eq!(json["amount"], "0.5");
    }

    #[test]
    fn test_response_without_intent() {
        let response: SimulateResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();

        assert!(response.success);
        assert_eq!(response.sources_total(), None);
        assert!(response.sources().is_empty());
    }

    #[test]
    fn test_response_with_total() {
        let json = r#"{
            "success": true,
            "intent": {
                "sourcesTotal": "1.0101",
                "allSources": [{
                    "chainID": 1,
                    "chainLogo": "",
                    "chainName": "Ethereum",
                    "amount": "1.0101",
                    "contractAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
                }]
            }
        }"#;

        let response: SimulateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.sources_total(), Some("1.0101"));
        assert_eq!(response.sources().len(), 1);
        assert_eq!(response.sources()[0].chain_name, "Ethereum");
    }
}
