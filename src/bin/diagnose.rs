//! Diagnostic tool - Check quoter configuration
//!
//! Run with: cargo run --bin diagnose

use std::env;

use intent_quoter::QuoterConfig;

fn main() {
    println!("🔍 QUOTER DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("QUOTER_SIMULATE_URL", "http://localhost:8080/simulate", "Bridge simulate endpoint"),
        ("QUOTER_SOURCE_CHAINS", "42161", "Chains funds come from"),
        ("QUOTER_DESTINATION_CHAIN", "8453", "Chain funds land on"),
        ("QUOTER_TOKEN", "USDC", "Token bridged"),
        ("QUOTER_CACHE_TTL_MS", "15000", "How long a quote stays cached"),
        ("QUOTER_MIN_FETCH_INTERVAL_MS", "15000", "Minimum time between searches"),
        ("QUOTER_DEBOUNCE_MS", "1500", "Quiet period before quoting an edit"),
        ("QUOTER_SEARCH_ITERATIONS", "8", "Oracle calls per search"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let is_default = env::var(key).is_err();
        let marker = if is_default { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    println!("═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    let config = match QuoterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Could not load configuration: {}", e);
            return;
        }
    };

    match config.validate() {
        Ok(()) => println!("  ✅ Configuration is valid"),
        Err(e) => println!("  ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                  WHAT TO EXPECT                    ");
    println!("═══════════════════════════════════════════════════\n");

    let settings = config.engine_settings();
    println!(
        "  • Each new amount costs {} sequential simulate calls",
        settings.search_iterations
    );
    println!(
        "  • At most one search every {:.1}s; edits inside that window are dropped",
        settings.min_fetch_interval.as_secs_f64()
    );
    println!(
        "  • Repeated amounts within {:.1}s are served from cache ({} entries max)",
        settings.cache_ttl.as_secs_f64(),
        settings.cache_capacity
    );
    println!(
        "  • Search precision: 1/{} of the send amount",
        1u64 << settings.search_iterations.min(63)
    );

    if settings.search_iterations > 12 {
        println!("\n  ⚠️  Many iterations! Each quote will take noticeably longer.");
    }

    println!("\n✅ Diagnostic complete!\n");
}
