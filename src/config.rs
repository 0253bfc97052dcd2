//! Quoter Configuration
//!
//! Bridge endpoint, default route and the engine's cache / rate-limit /
//! search tuning. Loaded from environment variables (and `.env`) or TOML.

use alloy_primitives::ChainId;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{
    EngineSettings, CACHE_CAPACITY, CACHE_TTL_MS, DEBOUNCE_MS, FALLBACK_OUTPUT_RATIO,
    MIN_FETCH_INTERVAL_MS, MIN_SEND_AMOUNT, SEARCH_ITERATIONS,
};
use crate::oracle::HttpBridgeSimulator;
use crate::quote::BridgeRoute;

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoterConfig {
    // ========== Bridge Service ==========
    /// Simulate endpoint of the bridge service
    pub simulate_url: String,

    /// Timeout for one simulate call
    pub request_timeout_secs: u64,

    // ========== Default Route ==========
    /// Chains funds may come from
    pub source_chains: Vec<ChainId>,

    /// Chain funds should land on
    pub destination_chain: ChainId,

    /// Token symbol bridged (same on both sides)
    pub token: String,

    // ========== Cache ==========
    pub cache_ttl_ms: u64,
    pub cache_capacity: usize,

    // ========== Rate Limiting ==========
    /// Minimum time between completed searches
    pub min_fetch_interval_ms: u64,

    /// Quiet period before an amount edit triggers a quote
    pub debounce_ms: u64,

    // ========== Search ==========
    /// Oracle round-trips per search
    pub search_iterations: u32,

    /// Output share of the fallback quote (0.993 = 0.7% fee)
    pub fallback_output_ratio: f64,

    /// Smallest quotable send amount
    pub min_send_amount: f64,
}

impl QuoterConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            simulate_url: env::var("QUOTER_SIMULATE_URL").unwrap_or(defaults.simulate_url),
            request_timeout_secs: env_or("QUOTER_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            source_chains: env::var("QUOTER_SOURCE_CHAINS")
                .map(|s| parse_chain_list(&s))
                .unwrap_or_else(|_| Ok(defaults.source_chains.clone()))?,
            destination_chain: env_or("QUOTER_DESTINATION_CHAIN", defaults.destination_chain),
            token: env::var("QUOTER_TOKEN").unwrap_or(defaults.token),
            cache_ttl_ms: env_or("QUOTER_CACHE_TTL_MS", defaults.cache_ttl_ms),
            cache_capacity: env_or("QUOTER_CACHE_CAPACITY", defaults.cache_capacity),
            min_fetch_interval_ms: env_or("QUOTER_MIN_FETCH_INTERVAL_MS", defaults.min_fetch_interval_ms),
            debounce_ms: env_or("QUOTER_DEBOUNCE_MS", defaults.debounce_ms),
            search_iterations: env_or("QUOTER_SEARCH_ITERATIONS", defaults.search_iterations),
            fallback_output_ratio: env_or("QUOTER_FALLBACK_OUTPUT_RATIO", defaults.fallback_output_ratio),
            min_send_amount: env_or("QUOTER_MIN_SEND_AMOUNT", defaults.min_send_amount),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration before building an engine
    pub fn validate(&self) -> Result<()> {
        if self.simulate_url.is_empty() {
            return Err(eyre!("QUOTER_SIMULATE_URL must be set"));
        }
        if !self.simulate_url.starts_with("http://") && !self.simulate_url.starts_with("https://") {
            return Err(eyre!(
                "QUOTER_SIMULATE_URL must be an http(s) URL (got {})",
                self.simulate_url
            ));
        }
        if self.source_chains.is_empty() {
            return Err(eyre!("At least one source chain is required"));
        }
        if self.source_chains.contains(&self.destination_chain) {
            return Err(eyre!(
                "Destination chain {} is also listed as a source",
                self.destination_chain
            ));
        }
        if self.token.trim().is_empty() {
            return Err(eyre!("QUOTER_TOKEN must not be empty"));
        }
        if self.search_iterations == 0 {
            return Err(eyre!("QUOTER_SEARCH_ITERATIONS must be at least 1"));
        }
        if self.cache_capacity == 0 {
            return Err(eyre!("QUOTER_CACHE_CAPACITY must be at least 1"));
        }
        if self.fallback_output_ratio.is_nan()
            || self.fallback_output_ratio <= 0.0
            || self.fallback_output_ratio > 1.0
        {
            return Err(eyre!(
                "QUOTER_FALLBACK_OUTPUT_RATIO must be in (0, 1] (currently {})",
                self.fallback_output_ratio
            ));
        }
        if self.min_send_amount.is_nan() || self.min_send_amount <= 0.0 {
            return Err(eyre!("QUOTER_MIN_SEND_AMOUNT must be positive"));
        }

        Ok(())
    }

    /// Engine tuning derived from this configuration
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            cache_ttl: Duration::from_millis(self.cache_ttl_ms),
            cache_capacity: self.cache_capacity,
            min_fetch_interval: Duration::from_millis(self.min_fetch_interval_ms),
            search_iterations: self.search_iterations,
            fallback_output_ratio: self.fallback_output_ratio,
            min_send_amount: self.min_send_amount,
        }
    }

    /// Default route described by this configuration
    pub fn route(&self) -> BridgeRoute {
        BridgeRoute {
            source_chains: self.source_chains.clone(),
            destination_chain: self.destination_chain,
            from_token: self.token.clone(),
            to_token: self.token.clone(),
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// HTTP simulator for the configured endpoint
    pub fn simulator(&self) -> Result<HttpBridgeSimulator> {
        HttpBridgeSimulator::new(
            self.simulate_url.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              INTENT QUOTER - CONFIGURATION                 ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Simulate URL:      {:<40} ║", truncate(&self.simulate_url, 40));
        println!("║ Timeout:           {:<38} s ║", self.request_timeout_secs);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ ROUTE                                                      ║");
        println!("║ • Token:           {:<40} ║", self.token);
        println!("║ • Sources:         {:<40} ║", self.route().source_chain_list());
        println!("║ • Destination:     {:<40} ║", self.destination_chain);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CACHE & RATE LIMIT                                         ║");
        println!("║ • Cache TTL:       {:<37} ms ║", self.cache_ttl_ms);
        println!("║ • Cache Capacity:  {:<40} ║", self.cache_capacity);
        println!("║ • Min Interval:    {:<37} ms ║", self.min_fetch_interval_ms);
        println!("║ • Debounce:        {:<37} ms ║", self.debounce_ms);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SEARCH                                                     ║");
        println!("║ • Iterations:      {:<40} ║", self.search_iterations);
        println!("║ • Fallback Ratio:  {:<40} ║", self.fallback_output_ratio);
        println!("║ • Min Amount:      {:<40} ║", self.min_send_amount);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            simulate_url: "http://localhost:8080/simulate".to_string(),
            request_timeout_secs: crate::oracle::DEFAULT_TIMEOUT_SECS,
            source_chains: vec![42161], // Arbitrum One
            destination_chain: 8453,    // Base
            token: "USDC".to_string(),
            cache_ttl_ms: CACHE_TTL_MS,
            cache_capacity: CACHE_CAPACITY,
            min_fetch_interval_ms: MIN_FETCH_INTERVAL_MS,
            debounce_ms: DEBOUNCE_MS,
            search_iterations: SEARCH_ITERATIONS,
            fallback_output_ratio: FALLBACK_OUTPUT_RATIO,
            min_send_amount: MIN_SEND_AMOUNT,
        }
    }
}

// ============================================
// HELPERS
// ============================================

/// Parse an env var, falling back to `default` if unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse "1,10,42161" into chain ids
pub fn parse_chain_list(value: &str) -> Result<Vec<ChainId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<ChainId>()
                .map_err(|e| eyre!("Invalid chain id {:?}: {}", part, e))
        })
        .collect()
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QuoterConfig::default();
        assert_eq!(config.cache_ttl_ms, 15_000);
        assert_eq!(config.cache_capacity, 20);
        assert_eq!(config.min_fetch_interval_ms, 15_000);
        assert_eq!(config.debounce_ms, 1_500);
        assert_eq!(config.search_iterations, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = QuoterConfig::default();
        config.destination_chain = config.source_chains[0];
        assert!(config.validate().is_err());

        let mut config = QuoterConfig::default();
        config.search_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = QuoterConfig::default();
        config.fallback_output_ratio = 1.5;
        assert!(config.validate().is_err());

        for bad in [f64::NAN, 0.0, -0.5] {
            let mut config = QuoterConfig::default();
            config.fallback_output_ratio = bad;
            assert!(config.validate().is_err(), "ratio {}", bad);

            let mut config = QuoterConfig::default();
            config.min_send_amount = bad;
            assert!(config.validate().is_err(), "minimum {}", bad);
        }

        let mut config = QuoterConfig::default();
        config.simulate_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_chain_list() {
        assert_eq!(parse_chain_list("1, 10,42161").unwrap(), vec![1, 10, 42161]);
        assert_eq!(parse_chain_list("").unwrap(), Vec::<ChainId>::new());
        assert!(parse_chain_list("1,base").is_err());
    }

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let config: QuoterConfig = toml::from_str(
            r#"
            simulate_url = "https://bridge.example.org/simulate"
            source_chains = [1, 10]
            destination_chain = 8453
            token = "ETH"
            "#,
        )
        .unwrap();

        assert_eq!(config.source_chains, vec![1, 10]);
        assert_eq!(config.token, "ETH");
        // Unspecified fields keep their defaults
        assert_eq!(config.search_iterations, SEARCH_ITERATIONS);

        let route = config.route();
        assert_eq!(route.from_token, "ETH");
        assert_eq!(route.to_token, "ETH");
        assert_eq!(route.destination_chain, 8453);
    }

    #[test]
    fn test_engine_settings_conversion() {
        let mut config = QuoterConfig::default();
        config.cache_ttl_ms = 2_000;
        config.search_iterations = 12;

        let settings = config.engine_settings();
        assert_eq!(settings.cache_ttl, Duration::from_millis(2_000));
        assert_eq!(settings.search_iterations, 12);
        assert_eq!(settings.min_fetch_interval, Duration::from_millis(15_000));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
