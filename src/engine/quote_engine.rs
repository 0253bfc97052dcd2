//! Quote Engine
//!
//! Turns "send S of token T from chain A to chain B" into a quote while
//! staying inside the bridge API's rate budget.
//!
//! Guards run in order, each one can end the request without an oracle call:
//! 1. a search is already in flight → no-op
//! 2. same amount as last time → no-op
//! 3. fresh cache entry → cached quote
//! 4. rate limit window still open → silently dropped
//! 5. amount / route validation → error reported, quote cleared
//! 6. caller-supplied balance → error reported, quote cleared
//!
//! Past the guards the bounded search runs; if it panics, a flat-fee
//! fallback quote is used instead. Both are cached and count as a fetch.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::cache::{QuoteCache, CACHE_CAPACITY, CACHE_TTL_MS};
use super::failure::QuoteFailure;
use super::search::{
    fallback_quote, find_max_receive_for_send, FALLBACK_OUTPUT_RATIO, SEARCH_ITERATIONS,
};
use super::throttle::{FetchThrottle, MIN_FETCH_INTERVAL_MS};
use crate::oracle::BridgeSimulator;
use crate::quote::{parse_amount, BridgeRoute, Quote};

/// Smallest send amount the engine will quote
pub const MIN_SEND_AMOUNT: f64 = 0.001;

// ============================================
// SETTINGS & STATE
// ============================================

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub min_fetch_interval: Duration,
    pub search_iterations: u32,
    pub fallback_output_ratio: f64,
    pub min_send_amount: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_millis(CACHE_TTL_MS),
            cache_capacity: CACHE_CAPACITY,
            min_fetch_interval: Duration::from_millis(MIN_FETCH_INTERVAL_MS),
            search_iterations: SEARCH_ITERATIONS,
            fallback_output_ratio: FALLBACK_OUTPUT_RATIO,
            min_send_amount: MIN_SEND_AMOUNT,
        }
    }
}

/// What observers see: latest quote, whether a search runs, latest error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteState {
    pub quote: Option<Quote>,
    pub is_fetching: bool,
    pub error: Option<QuoteFailure>,
}

struct EngineState {
    route: BridgeRoute,
    /// Available balance of the source token, if the caller knows it
    balance: Option<String>,
    cache: QuoteCache,
    throttle: FetchThrottle,
}

/// Outcome of the synchronous guards
enum Admission {
    Cached(Quote),
    Search(SearchPlan),
    Rejected(QuoteFailure),
    Dropped,
}

struct SearchPlan {
    key: String,
    send_amount: f64,
    route: BridgeRoute,
}

// ============================================
// QUOTE ENGINE
// ============================================

pub struct QuoteEngine<O> {
    oracle: O,
    settings: EngineSettings,
    state: Mutex<EngineState>,
    in_flight: AtomicBool,
    updates: watch::Sender<QuoteState>,
}

impl<O: BridgeSimulator> QuoteEngine<O> {
    pub fn new(oracle: O, route: BridgeRoute, settings: EngineSettings) -> Self {
        let (updates, _) = watch::channel(QuoteState::default());

        Self {
            oracle,
            state: Mutex::new(EngineState {
                route,
                balance: None,
                cache: QuoteCache::new(settings.cache_ttl, settings.cache_capacity),
                throttle: FetchThrottle::new(settings.min_fetch_interval),
            }),
            settings,
            in_flight: AtomicBool::new(false),
            updates,
        }
    }

    /// Quote `send_amount` on the current route.
    ///
    /// Returns the resolved, cached or fallback quote, or `None` when the
    /// request was ignored, dropped or rejected. Never fails; rejections and
    /// oracle trouble are published as `QuoteState::error`.
    pub async fn request_quote(&self, send_amount: &str) -> Option<Quote> {
        let Some(_claim) = InFlightClaim::acquire(&self.in_flight) else {
            debug!("Quote for {} ignored: search already in flight", send_amount);
            return None;
        };

        let plan = match self.admit(send_amount) {
            Admission::Search(plan) => plan,
            Admission::Cached(quote) => {
                debug!("📦 Cached quote for {}: {}", send_amount, quote.output);
                self.publish_quote(quote.clone(), None);
                return Some(quote);
            }
            Admission::Rejected(failure) => {
                info!("Quote for {} rejected: {}", send_amount, failure);
                self.updates.send_modify(|state| {
                    state.quote = None;
                    state.error = Some(failure);
                });
                return None;
            }
            Admission::Dropped => return None,
        };

        let _fetching = FetchingFlag::raise(&self.updates);
        let token = plan.route.from_token.clone();

        let search = find_max_receive_for_send(
            &self.oracle,
            &plan.route,
            plan.send_amount,
            self.settings.search_iterations,
        );
        let (quote, failure) = match AssertUnwindSafe(search).catch_unwind().await {
            Ok(outcome) => (outcome.quote, outcome.last_failure),
            Err(panic) => {
                let message = panic_message(&*panic);
                let failure = QuoteFailure::classify(message, &token);
                warn!("Quote search panicked ({}), using fallback: {}", failure, message);
                (
                    fallback_quote(plan.send_amount, self.settings.fallback_output_ratio),
                    Some(failure),
                )
            }
        };

        {
            let mut state = self.lock_state();
            state.cache.insert(plan.key, quote.clone());
            state.throttle.record_fetch();
        }

        info!(
            "💱 Quote {} {} on {}: receive {} (fee {}, {} sources, {})",
            send_amount,
            token,
            plan.route,
            quote.output,
            quote.bridge_fee,
            quote.source_count,
            quote.origin
        );

        self.publish_quote(quote.clone(), failure);
        Some(quote)
    }

    /// Run guards 2-6 under the state lock
    fn admit(&self, send_amount: &str) -> Admission {
        let mut state = self.lock_state();

        if state.throttle.is_duplicate(send_amount) {
            trace!("Quote for {} ignored: same as last amount", send_amount);
            return Admission::Dropped;
        }

        let key = state.route.cache_key(send_amount);
        if let Some(quote) = state.cache.get(&key).cloned() {
            state.throttle.note_amount(send_amount);
            return Admission::Cached(quote);
        }

        if let Some(remaining) = state.throttle.cooldown_remaining() {
            debug!(
                "⏳ Quote for {} dropped: rate limited for another {:?}",
                send_amount, remaining
            );
            return Admission::Dropped;
        }

        state.throttle.note_amount(send_amount);

        let send = match parse_amount(send_amount) {
            Some(value) if value > 0.0 => value,
            _ => {
                return Admission::Rejected(QuoteFailure::InvalidAmount {
                    amount: send_amount.to_string(),
                })
            }
        };
        if send < self.settings.min_send_amount {
            return Admission::Rejected(QuoteFailure::BelowMinimum {
                amount: send_amount.to_string(),
                minimum: self.settings.min_send_amount,
            });
        }
        if state.route.is_same_network() {
            return Admission::Rejected(QuoteFailure::SameNetwork);
        }
        if !state.route.tokens_match() {
            return Admission::Rejected(QuoteFailure::TokenMismatch {
                from: state.route.from_token.clone(),
                to: state.route.to_token.clone(),
            });
        }

        if let Some(balance) = state.balance.as_deref() {
            let available = parse_amount(balance).unwrap_or(0.0);
            if send > available {
                return Admission::Rejected(QuoteFailure::InsufficientBalance {
                    token: state.route.from_token.clone(),
                    requested: send,
                    available,
                });
            }
        }

        Admission::Search(SearchPlan {
            key,
            send_amount: send,
            route: state.route.clone(),
        })
    }

    fn publish_quote(&self, quote: Quote, error: Option<QuoteFailure>) {
        self.updates.send_modify(|state| {
            state.quote = Some(quote);
            state.error = error;
        });
    }

    // ============================================
    // ROUTE & BALANCE
    // ============================================

    /// Switch route. The last amount is forgotten so it can be re-quoted on
    /// the new route; cache and rate limit are kept.
    pub fn set_route(&self, route: BridgeRoute) {
        let mut state = self.lock_state();
        if state.route != route {
            info!("Route changed: {} → {}", state.route, route);
            state.route = route;
            state.throttle.clear_last_amount();
        }
    }

    pub fn route(&self) -> BridgeRoute {
        self.lock_state().route.clone()
    }

    /// Available balance of the source token; `None` skips the balance check
    pub fn set_balance(&self, balance: Option<String>) {
        self.lock_state().balance = balance;
    }

    // ============================================
    // OBSERVERS
    // ============================================

    /// Follow state transitions (fetching → resolved | error)
    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.updates.subscribe()
    }

    pub fn current_quote(&self) -> Option<Quote> {
        self.updates.borrow().quote.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.updates.borrow().is_fetching
    }

    pub fn last_error(&self) -> Option<QuoteFailure> {
        self.updates.borrow().error.clone()
    }

    /// Stored cache entries, expired ones included
    pub fn cached_quote_count(&self) -> usize {
        self.lock_state().cache.len()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        // State stays consistent across a panic, keep using it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Text carried by a caught panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "search panicked"
    }
}

// ============================================
// GUARDS
// ============================================

/// Holds the engine's in-flight flag; released on drop
struct InFlightClaim<'a>(&'a AtomicBool);

impl<'a> InFlightClaim<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Publishes `is_fetching = true` for its lifetime, resets it on any exit
struct FetchingFlag<'a>(&'a watch::Sender<QuoteState>);

impl<'a> FetchingFlag<'a> {
    fn raise(updates: &'a watch::Sender<QuoteState>) -> Self {
        updates.send_modify(|state| {
            state.is_fetching = true;
            state.error = None;
        });
        Self(updates)
    }
}

impl Drop for FetchingFlag<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|state| state.is_fetching = false);
    }
}

// ============================================
// TESTS
// ============================================
