//! The Quote Engine
//!
//! Responsible for:
//! - Searching the bridge oracle for the best receive amount (bounded bisection)
//! - Caching finished quotes (TTL + FIFO capacity)
//! - Rate limiting and de-duplicating requests
//! - Debouncing caller-driven amount changes

mod cache;
mod debounce;
mod failure;
mod quote_engine;
mod search;
mod throttle;

pub use cache::{QuoteCache, CACHE_CAPACITY, CACHE_TTL_MS};
pub use debounce::{QuoteDebouncer, DEBOUNCE_MS};
pub use failure::QuoteFailure;
pub use quote_engine::{EngineSettings, QuoteEngine, QuoteState, MIN_SEND_AMOUNT};
pub use search::{
    fallback_quote, find_max_receive_for_send, SearchOutcome, FALLBACK_OUTPUT_RATIO,
    SEARCH_ITERATIONS,
};
pub use throttle::{FetchThrottle, MIN_FETCH_INTERVAL_MS};
