//! Intent Quoter
//!
//! Fee-aware quote engine for cross-chain bridge intents: finds how much of a
//! token arrives on the destination chain for a given send amount.

pub mod config;
pub mod engine;
pub mod oracle;
pub mod quote;

pub use config::QuoterConfig;
pub use engine::{QuoteDebouncer, QuoteEngine, QuoteFailure, QuoteState};
pub use oracle::{BridgeSimulator, HttpBridgeSimulator};
pub use quote::{BridgeRoute, Quote, QuoteOrigin, SourceRecord};
