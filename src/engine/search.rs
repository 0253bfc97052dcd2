//! Bounded Receive-Amount Search
//!
//! Finds the largest receive amount R in [0, S] whose simulated source total
//! still fits inside the send amount S. The bridge's cost for delivering R is
//! non-decreasing in R, so feasibility is monotone and a bisection works.
//!
//! The loop runs a FIXED number of iterations (8 by default): at most 8
//! sequential oracle round-trips, precision S / 2^8.

use tracing::{debug, trace, warn};

use super::failure::QuoteFailure;
use crate::oracle::{BridgeSimulator, SimulateRequest};
use crate::quote::{parse_amount, BridgeRoute, Quote, SourceRecord};

// ============================================
// CONSTANTS
// ============================================

/// Oracle round-trips per search
pub const SEARCH_ITERATIONS: u32 = 8;

/// Share of the send amount the fallback quote delivers (flat 0.7% fee)
pub const FALLBACK_OUTPUT_RATIO: f64 = 0.993;

// ============================================
// SEARCH OUTCOME
// ============================================

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub quote: Quote,

    /// Oracle calls made
    pub oracle_calls: u32,

    /// Iterations whose midpoint was feasible
    pub feasible_steps: u32,

    /// Most recent classified oracle error, if any iteration failed
    pub last_failure: Option<QuoteFailure>,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            quote: Quote::zero(),
            oracle_calls: 0,
            feasible_steps: 0,
            last_failure: None,
        }
    }
}

// ============================================
// BOUNDED BINARY SEARCH
// ============================================

/// Maximum receivable amount for sending `send_amount` along `route`.
///
/// Oracle failures and unreadable totals mark the midpoint infeasible and
/// the loop carries on, so exactly `iterations` oracle calls are made.
pub async fn find_max_receive_for_send<O: BridgeSimulator>(
    oracle: &O,
    route: &BridgeRoute,
    send_amount: f64,
    iterations: u32,
) -> SearchOutcome {
    if !send_amount.is_finite() || send_amount <= 0.0 {
        debug!("Send amount {} is not positive, skipping search", send_amount);
        return SearchOutcome::empty();
    }

    let mut low = 0.0_f64;
    let mut high = send_amount;
    let mut best_valid_r = 0.0_f64;
    let mut best_sources: Vec<SourceRecord> = Vec::new();
    let mut outcome = SearchOutcome::empty();

    for step in 1..=iterations {
        let mid = (low + high) / 2.0;
        let request = SimulateRequest {
            token: route.from_token.clone(),
            amount: mid.to_string(),
            chain_id: route.destination_chain,
            source_chains: route.source_chains.clone(),
        };

        outcome.oracle_calls += 1;
        match oracle.simulate(&request).await {
            Ok(response) if response.success => match response.sources_total() {
                Some(raw_total) => {
                    let Some(required) = parse_amount(raw_total) else {
                        debug!(
                            "  [{}/{}] R={} unreadable sourcesTotal {:?}",
                            step, iterations, mid, raw_total
                        );
                        outcome.last_failure = Some(QuoteFailure::Unexpected);
                        high = mid;
                        continue;
                    };

                    if required <= send_amount {
                        trace!(
                            "  [{}/{}] R={} needs {} ≤ {} ✓",
                            step, iterations, mid, required, send_amount
                        );
                        best_valid_r = mid;
                        best_sources = response.sources();
                        outcome.feasible_steps += 1;
                        low = mid;
                    } else {
                        trace!(
                            "  [{}/{}] R={} needs {} > {} ✗",
                            step, iterations, mid, required, send_amount
                        );
                        high = mid;
                    }
                }
                None => {
                    // No total reported: the bridge accepted the amount as-is
                    trace!("  [{}/{}] R={} accepted without total", step, iterations, mid);
                    best_valid_r = mid;
                    best_sources = response.sources();
                    outcome.feasible_steps += 1;
                    low = mid;
                }
            },
            Ok(_) => {
                trace!("  [{}/{}] R={} rejected by bridge", step, iterations, mid);
                high = mid;
            }
            Err(e) => {
                let failure = QuoteFailure::classify(&format!("{:#}", e), &route.from_token);
                debug!(
                    "  [{}/{}] R={} simulate failed ({:?}): {}",
                    step, iterations, mid, failure, e
                );
                outcome.last_failure = Some(failure);
                high = mid;
            }
        }
    }

    if outcome.feasible_steps == 0 {
        warn!(
            "No feasible receive amount found for {} {} after {} iterations",
            send_amount, route.from_token, iterations
        );
    }

    outcome.quote = Quote::searched(send_amount, best_valid_r, best_sources);
    debug!(
        "Search done: send {} → receive {} (fee {}) in {} calls",
        send_amount, outcome.quote.output, outcome.quote.bridge_fee, outcome.oracle_calls
    );

    outcome
}

/// Heuristic quote used when the search itself fails
pub fn fallback_quote(send_amount: f64, output_ratio: f64) -> Quote {
    Quote::fallback(send_amount, output_ratio)
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::mock::ScriptedSimulator;
    use crate::oracle::SimulateResponse;
    use crate::quote::QuoteOrigin;
    use alloy_primitives::Address;
    use eyre::eyre;

    fn route() -> BridgeRoute {
        BridgeRoute::new(42161, 8453, "USDC")
    }

    #[tokio::test]
    async fn test_sample_scenario_converges_near_fee_ratio() {
        let oracle = ScriptedSimulator::with_fee_ratio(0.99);

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS)
            .await;

        let output = outcome.quote.output_amount();
        assert!((output - 0.99).abs() <= 0.004, "output {}", output);
        assert!((outcome.quote.bridge_fee_amount() - 0.01).abs() <= 0.004);
        assert_eq!(outcome.oracle_calls, SEARCH_ITERATIONS);
        assert_eq!(oracle.call_count(), SEARCH_ITERATIONS as usize);
        assert!(outcome.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_returns_largest_feasible_midpoint() {
        for &(send, ratio) in &[(1.0, 0.99), (250.0, 0.97), (0.001, 0.5), (10_000.0, 0.999)] {
            let oracle = ScriptedSimulator::with_fee_ratio(ratio);
            let outcome = find_max_receive_for_send(&oracle, &route(), send, SEARCH_ITERATIONS)
                .await;

            let best_tested = oracle
                .requested_amounts()
                .into_iter()
                .filter(|r| r / ratio <= send)
                .fold(0.0_f64, f64::max);

            let output = outcome.quote.output_amount();
            assert!((output - best_tested).abs() < 1e-6, "send {} ratio {}", send, ratio);

            // Within one search step of the true optimum
            let precision = send / 2f64.powi(SEARCH_ITERATIONS as i32);
            assert!(send * ratio - output <= precision + 1e-6);
        }
    }

    #[tokio::test]
    async fn test_all_failures_give_zero_output() {
        let oracle = ScriptedSimulator::failing("InternalRpcError: node unavailable");

        let outcome = find_max_receive_for_send(&oracle, &route(), 5.0, SEARCH_ITERATIONS)
            .await;

        assert_eq!(oracle.call_count(), 8);
        assert_eq!(outcome.quote.output_amount(), 0.0);
        assert_eq!(outcome.quote.bridge_fee_amount(), 5.0);
        assert!(outcome.quote.all_sources.is_empty());
        assert_eq!(outcome.last_failure, Some(QuoteFailure::RpcError));

        // Every failure halves the window downward
        let amounts = oracle.requested_amounts();
        assert_eq!(amounts[0], 2.5);
        assert_eq!(amounts[1], 1.25);
    }

    #[tokio::test]
    async fn test_insufficient_funds_treated_as_infeasible() {
        let oracle = ScriptedSimulator::new(|receive| {
            if receive > 3.0 {
                Err(eyre!("Insufficient funds for fees"))
            } else {
                Ok(SimulateResponse::with_total(receive.to_string(), Vec::new()))
            }
        });

        let outcome = find_max_receive_for_send(&oracle, &route(), 4.0, SEARCH_ITERATIONS)
            .await;

        let output = outcome.quote.output_amount();
        assert!(output <= 3.0 && output > 2.9, "output {}", output);
        assert_eq!(outcome.last_failure, Some(QuoteFailure::InsufficientFeeFunds));
    }

    #[tokio::test]
    async fn test_first_iteration_failure_does_not_stop_search() {
        let oracle = ScriptedSimulator::new(|receive| {
            if receive == 0.5 {
                Err(eyre!("TIMED_OUT"))
            } else {
                Ok(SimulateResponse::with_total(receive.to_string(), Vec::new()))
            }
        });

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS)
            .await;

        assert_eq!(oracle.call_count(), 8);
        // After the failed 0.5 everything below is feasible: 0.25 + ... + 2^-8
        assert_eq!(outcome.quote.output, "0.496094");
        assert_eq!(outcome.last_failure, Some(QuoteFailure::NetworkTimeout));
    }

    #[tokio::test]
    async fn test_missing_total_counts_as_feasible() {
        let oracle = ScriptedSimulator::new(|_| {
            Ok(SimulateResponse {
                success: true,
                intent: None,
            })
        });

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS)
            .await;

        assert_eq!(outcome.quote.output, "0.996094");
        assert_eq!(outcome.feasible_steps, 8);
    }

    #[tokio::test]
    async fn test_unsuccessful_response_is_infeasible() {
        let oracle = ScriptedSimulator::new(|_| Ok(SimulateResponse::default()));

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS)
            .await;

        assert_eq!(outcome.quote.output_amount(), 0.0);
        assert!(outcome.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_zero_and_non_finite_send_skip_oracle() {
        let oracle = ScriptedSimulator::with_fee_ratio(0.99);

        for send in [0.0, f64::NAN, f64::INFINITY] {
            let outcome = find_max_receive_for_send(&oracle, &route(), send, SEARCH_ITERATIONS)
                .await;
            assert_eq!(outcome.quote.output, "0");
            assert_eq!(outcome.quote.bridge_fee, "0");
            assert!(outcome.quote.all_sources.is_empty());
        }

        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_total_is_infeasible_midpoint() {
        // 10% fee, but the bridge garbles the total at one midpoint
        let oracle = ScriptedSimulator::new(|receive| {
            if receive == 0.875 {
                Ok(SimulateResponse::with_total("", Vec::new()))
            } else {
                Ok(SimulateResponse::with_total((receive / 0.9).to_string(), Vec::new()))
            }
        });

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS).await;

        assert_eq!(oracle.call_count(), 8);
        assert_eq!(outcome.oracle_calls, SEARCH_ITERATIONS);
        let output = outcome.quote.output_amount();
        assert!(output <= 0.9 && output > 0.85, "output {}", output);
        assert_eq!(outcome.quote.origin, QuoteOrigin::Search);
        assert_eq!(outcome.last_failure, Some(QuoteFailure::Unexpected));
    }

    #[tokio::test]
    async fn test_every_total_unreadable_gives_zero_output() {
        let oracle =
            ScriptedSimulator::new(|_| Ok(SimulateResponse::with_total("n/a", Vec::new())));

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS).await;

        assert_eq!(oracle.call_count(), 8);
        assert_eq!(outcome.quote.output_amount(), 0.0);
        assert_eq!(outcome.quote.bridge_fee_amount(), 1.0);
        assert_eq!(outcome.last_failure, Some(QuoteFailure::Unexpected));
    }

    #[tokio::test]
    async fn test_keeps_sources_of_best_midpoint() {
        let oracle = ScriptedSimulator::new(|receive| {
            let source = SourceRecord {
                chain_id: 42161,
                chain_logo: String::new(),
                chain_name: "Arbitrum One".to_string(),
                amount: (receive / 0.99).to_string(),
                contract_address: Address::ZERO,
            };
            Ok(SimulateResponse::with_total((receive / 0.99).to_string(), vec![source]))
        });

        let outcome = find_max_receive_for_send(&oracle, &route(), 1.0, SEARCH_ITERATIONS)
            .await;

        assert_eq!(outcome.quote.source_count, 1);
        let contributed = parse_amount(&outcome.quote.all_sources[0].amount).unwrap();
        assert!(contributed <= 1.0);
        assert!((contributed * 0.99 - outcome.quote.output_amount()).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_request_carries_route() {
        let oracle = ScriptedSimulator::with_fee_ratio(0.99);
        let mut route = route();
        route.source_chains.push(10);

        find_max_receive_for_send(&oracle, &route, 1.0, 1).await;

        let request = oracle.last_request().unwrap();
        assert_eq!(request.token, "USDC");
        assert_eq!(request.chain_id, 8453);
        assert_eq!(request.source_chains, vec![42161, 10]);
        assert_eq!(request.amount, "0.5");
    }

    #[test]
    fn test_fallback_quote() {
        let quote = fallback_quote(2.0, FALLBACK_OUTPUT_RATIO);
        assert_eq!(quote.output, "1.986000");
        assert_eq!(quote.bridge_fee, "0.014000");
        assert!(quote.is_fallback());
    }
}
