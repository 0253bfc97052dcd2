//! Quote Failures
//!
//! Everything that can go wrong on the way to a quote, each with its own
//! user-facing message. The engine reports these through its state channel;
//! none of them escape `request_quote` as an error.

// ============================================
// FAILURE TAXONOMY
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteFailure {
    /// Amount is not a finite decimal number
    InvalidAmount { amount: String },

    /// Amount is below the smallest quotable send
    BelowMinimum { amount: String, minimum: f64 },

    /// A source chain is also the destination chain
    SameNetwork,

    /// Source and destination token symbols differ
    TokenMismatch { from: String, to: String },

    /// Caller-supplied balance does not cover the send amount
    InsufficientBalance {
        token: String,
        requested: f64,
        available: f64,
    },

    /// Bridge reports the aggregated balance across sources is too low
    InsufficientAggregatedFunds { token: String },

    /// Bridge reports there is not enough to pay fees or approvals
    InsufficientFeeFunds,

    /// Bridge RPC / internal failure
    RpcError,

    /// The bridge call timed out or the connection dropped
    NetworkTimeout,

    /// Anything we could not classify
    Unexpected,
}

impl std::fmt::Display for QuoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteFailure::InvalidAmount { amount } => {
                write!(f, "Invalid amount \"{}\": enter a positive number", amount)
            }
            QuoteFailure::BelowMinimum { amount, minimum } => {
                write!(f, "Amount {} is below the minimum of {}", amount, minimum)
            }
            QuoteFailure::SameNetwork => {
                write!(f, "Source and destination networks must be different")
            }
            QuoteFailure::TokenMismatch { .. } => {
                write!(f, "Source and destination tokens must match for bridging")
            }
            QuoteFailure::InsufficientBalance {
                token,
                requested,
                available,
            } => write!(
                f,
                "Insufficient {} balance: requested {}, available {} (short by {})",
                token,
                requested,
                available,
                crate::quote::format_amount(requested - available)
            ),
            QuoteFailure::InsufficientAggregatedFunds { token } => write!(
                f,
                "Insufficient balance in aggregated funds for {}",
                token
            ),
            QuoteFailure::InsufficientFeeFunds => write!(
                f,
                "Insufficient funds to cover bridge fees or approvals"
            ),
            QuoteFailure::RpcError => {
                write!(f, "Bridge service RPC error, please try again shortly")
            }
            QuoteFailure::NetworkTimeout => {
                write!(f, "Network timeout while fetching quote, please retry")
            }
            QuoteFailure::Unexpected => write!(
                f,
                "An unexpected error occurred, please refresh and try again"
            ),
        }
    }
}

impl std::error::Error for QuoteFailure {}

impl QuoteFailure {
    /// Classify a bridge error message
    pub fn classify(message: &str, token: &str) -> Self {
        if message.contains("Insufficient") {
            if message.to_lowercase().contains("balance") {
                QuoteFailure::InsufficientAggregatedFunds {
                    token: token.to_string(),
                }
            } else {
                QuoteFailure::InsufficientFeeFunds
            }
        } else if message.contains("InternalRpcError") || message.contains("GrpcWebError") {
            QuoteFailure::RpcError
        } else if message.contains("TIMED_OUT")
            || message.contains("Response closed without headers")
        {
            QuoteFailure::NetworkTimeout
        } else {
            QuoteFailure::Unexpected
        }
    }

    /// True for failures raised before any oracle call
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            QuoteFailure::InvalidAmount { .. }
                | QuoteFailure::BelowMinimum { .. }
                | QuoteFailure::SameNetwork
                | QuoteFailure::TokenMismatch { .. }
                | QuoteFailure::InsufficientBalance { .. }
        )
    }
}

// ============================================
// TESTS
// ============================================
