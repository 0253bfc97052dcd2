//! Intent Quoter - Bridge Quote CLI
//!
//! Run with: cargo run -- quote --amount 100
//!
//! Modes:
//! - `quote`: one bounded search, print the quote
//! - `watch`: read amounts from stdin, debounce them like a UI would
//! - `config`: print (and optionally save) the effective configuration

use alloy_primitives::ChainId;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intent_quoter::{
    HttpBridgeSimulator, Quote, QuoteDebouncer, QuoteEngine, QuoteState, QuoterConfig,
};

#[derive(Parser)]
#[command(name = "quoter", version, about = "Fee-aware cross-chain bridge quotes")]
struct Cli {
    /// TOML config file (defaults to environment / .env)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Token symbol to bridge
    #[arg(long, global = true)]
    token: Option<String>,

    /// Source chain ids, comma separated
    #[arg(long = "from", global = true, value_delimiter = ',')]
    source_chains: Vec<ChainId>,

    /// Destination chain id
    #[arg(long = "to", global = true)]
    destination_chain: Option<ChainId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Quote a single send amount
    Quote {
        /// Amount to send
        #[arg(long)]
        amount: String,

        /// Available balance of the token on the source side
        #[arg(long)]
        balance: Option<String>,

        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read amounts from stdin (one per line) and quote them debounced
    Watch {
        /// Available balance of the token on the source side
        #[arg(long)]
        balance: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Also write it to this TOML file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 🌉 INTENT QUOTER - Cross-Chain Bridge Quotes").cyan().bold());
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn load_config(cli: &Cli) -> Result<QuoterConfig> {
    let mut config = match &cli.config {
        Some(path) => QuoterConfig::from_file(path)?,
        None => QuoterConfig::from_env()?,
    };

    if let Some(token) = &cli.token {
        config.token = token.clone();
    }
    if !cli.source_chains.is_empty() {
        config.source_chains = cli.source_chains.clone();
    }
    if let Some(destination) = cli.destination_chain {
        config.destination_chain = destination;
    }

    Ok(config)
}

fn build_engine(
    config: &QuoterConfig,
    balance: Option<String>,
) -> Result<QuoteEngine<HttpBridgeSimulator>> {
    let engine = QuoteEngine::new(
        config.simulator()?,
        config.route(),
        config.engine_settings(),
    );
    engine.set_balance(balance);
    Ok(engine)
}

fn print_quote(quote: &Quote, send_amount: &str, token: &str) {
    println!("{} {} {} →", style("✓").green(), send_amount, token);
    println!("   Receive:    {} {}", style(&quote.output).green().bold(), token);
    println!("   Bridge fee: {} {}", quote.bridge_fee, token);
    println!("   Origin:     {}", quote.origin);

    if quote.all_sources.is_empty() {
        println!("   Sources:    (none reported)");
    } else {
        println!("   Sources ({}):", quote.source_count);
        for source in &quote.all_sources {
            println!(
                "     • {} [{}]: {}",
                source.chain_name, source.chain_id, source.amount
            );
        }
    }
}

fn print_state(state: &QuoteState, token: &str) {
    if state.is_fetching {
        println!("{} Searching...", style("⏳").yellow());
    } else if let Some(failure) = &state.error {
        println!("{} {}", style("✗").red(), failure);
    } else if let Some(quote) = &state.quote {
        println!(
            "{} receive {} {} (fee {}, {})",
            style("✓").green(),
            style(&quote.output).green().bold(),
            token,
            quote.bridge_fee,
            quote.origin
        );
    }
}

async fn run_quote(
    config: &QuoterConfig,
    amount: String,
    balance: Option<String>,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config, balance)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!(
        "Searching best receive amount for {} {} on {} ({} oracle calls)...",
        amount,
        config.token,
        engine.route(),
        engine.settings().search_iterations
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let quote = engine.request_quote(&amount).await;
    spinner.finish_and_clear();

    match quote {
        Some(quote) if json => println!("{}", serde_json::to_string_pretty(&quote)?),
        Some(quote) => print_quote(&quote, &amount, &config.token),
        None => {}
    }

    if let Some(failure) = engine.last_error() {
        println!("{} {}", style("⚠").yellow(), failure);
    }

    Ok(())
}

async fn run_watch(config: &QuoterConfig, balance: Option<String>) -> Result<()> {
    let engine = Arc::new(build_engine(config, balance)?);
    let debouncer = QuoteDebouncer::spawn(Arc::clone(&engine), config.debounce_delay());

    let printer = {
        let mut updates = engine.subscribe();
        let token = config.token.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                print_state(&state, &token);
            }
        })
    };

    println!(
        "Enter amounts of {} to quote, one per line (Ctrl-D to finish).",
        style(&config.token).cyan()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let amount = line.trim();
        if amount.is_empty() {
            continue;
        }
        debug!("Amount changed: {}", amount);
        debouncer.amount_changed(amount);
    }

    // Let the last edit fire and finish before exiting
    tokio::time::sleep(config.debounce_delay() + Duration::from_millis(100)).await;
    let mut updates = engine.subscribe();
    updates.wait_for(|state| !state.is_fetching).await?;

    drop(debouncer);
    printer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intent_quoter=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file or --config");
        return Err(e);
    }

    match cli.command {
        Command::Quote {
            amount,
            balance,
            json,
        } => {
            if !json {
                print_banner();
            }
            run_quote(&config, amount, balance, json).await?;
        }
        Command::Watch { balance } => {
            print_banner();
            run_watch(&config, balance).await?;
        }
        Command::Config { save } => {
            config.print_summary();
            if let Some(path) = save {
                config.save_to_file(&path)?;
                println!("{} Saved to {}", style("✓").green(), path.display());
            }
        }
    }

    Ok(())
}
