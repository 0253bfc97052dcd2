//! Quote Data Model
//!
//! A quote answers "if I send S of token T from chain A, how much arrives on
//! chain B?". Amounts travel as decimal strings (the bridge SDK's format) and
//! are parsed to `f64` only for arithmetic.

use alloy_primitives::{Address, ChainId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decimal places used for every amount string the engine produces
pub const AMOUNT_DECIMALS: usize = 6;

// ============================================
// SOURCE BREAKDOWN
// ============================================

/// One per-chain contribution selected by the bridge to fund a receive amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "chainID")]
    pub chain_id: ChainId,

    #[serde(rename = "chainLogo", default)]
    pub chain_logo: String,

    #[serde(rename = "chainName", default)]
    pub chain_name: String,

    /// Decimal string contributed by this chain
    pub amount: String,

    #[serde(rename = "contractAddress")]
    pub contract_address: Address,
}

// ============================================
// QUOTE
// ============================================

/// How a quote was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    /// Bounded binary search against the bridge oracle
    Search,

    /// Flat-fee heuristic used when the search itself failed
    Fallback,
}

impl std::fmt::Display for QuoteOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteOrigin::Search => write!(f, "Search"),
            QuoteOrigin::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Result of a quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Amount deliverable at the destination
    pub output: String,

    /// Requested send amount minus `output`
    pub bridge_fee: String,

    /// Source breakdown that produced `output`, in oracle order
    pub all_sources: Vec<SourceRecord>,

    /// Number of entries in `all_sources`
    pub source_count: usize,

    pub origin: QuoteOrigin,

    pub quoted_at: DateTime<Utc>,
}

impl Quote {
    /// Quote for a searched receive amount
    pub fn searched(send_amount: f64, receive_amount: f64, sources: Vec<SourceRecord>) -> Self {
        Self::build(send_amount, receive_amount, sources, QuoteOrigin::Search)
    }

    /// The empty quote returned for a zero or non-finite send amount
    pub fn zero() -> Self {
        Self {
            output: "0".to_string(),
            bridge_fee: "0".to_string(),
            all_sources: Vec::new(),
            source_count: 0,
            origin: QuoteOrigin::Search,
            quoted_at: Utc::now(),
        }
    }

    /// Heuristic quote: `send * output_ratio` arrives, the rest is fee
    pub fn fallback(send_amount: f64, output_ratio: f64) -> Self {
        Self::build(
            send_amount,
            send_amount * output_ratio,
            Vec::new(),
            QuoteOrigin::Fallback,
        )
    }

    fn build(
        send_amount: f64,
        receive_amount: f64,
        sources: Vec<SourceRecord>,
        origin: QuoteOrigin,
    ) -> Self {
        Self {
            output: format_amount(receive_amount),
            bridge_fee: format_amount(send_amount - receive_amount),
            source_count: sources.len(),
            all_sources: sources,
            origin,
            quoted_at: Utc::now(),
        }
    }

    /// `output` as a number (0 if unparseable)
    pub fn output_amount(&self) -> f64 {
        parse_amount(&self.output).unwrap_or(0.0)
    }

    /// `bridge_fee` as a number (0 if unparseable)
    pub fn bridge_fee_amount(&self) -> f64 {
        parse_amount(&self.bridge_fee).unwrap_or(0.0)
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == QuoteOrigin::Fallback
    }
}

// ============================================
// ROUTE
// ============================================

/// Where funds come from and where they should land
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRoute {
    /// Candidate source chains, in preference order
    pub source_chains: Vec<ChainId>,

    pub destination_chain: ChainId,

    /// Token symbol on the source side
    pub from_token: String,

    /// Token symbol on the destination side
    pub to_token: String,
}

impl BridgeRoute {
    /// Same-token route from a single source chain
    pub fn new(source_chain: ChainId, destination_chain: ChainId, token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            source_chains: vec![source_chain],
            destination_chain,
            from_token: token.clone(),
            to_token: token,
        }
    }

    /// Cache key for a send amount on this route
    pub fn cache_key(&self, send_amount: &str) -> String {
        format!(
            "{}-{}-{}-{}",
            self.source_chain_list(),
            self.destination_chain,
            self.from_token,
            send_amount
        )
    }

    /// Comma-joined source chain ids
    pub fn source_chain_list(&self) -> String {
        self.source_chains
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True if any source chain is also the destination
    pub fn is_same_network(&self) -> bool {
        self.source_chains.contains(&self.destination_chain)
    }

    pub fn tokens_match(&self) -> bool {
        self.from_token == self.to_token
    }
}

impl std::fmt::Display for BridgeRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] → {} [{}]",
            self.from_token,
            self.source_chain_list(),
            self.to_token,
            self.destination_chain
        )
    }
}

// ============================================
// AMOUNT HELPERS
// ============================================

/// Parse a decimal amount string; `None` if malformed or non-finite
pub fn parse_amount(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

/// Round to `AMOUNT_DECIMALS` places
pub fn format_amount(value: f64) -> String {
    format!("{:.*}", AMOUNT_DECIMALS, value)
}

// ============================================
// TESTS
// ============================================
