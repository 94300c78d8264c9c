//! Bridge audit command-line tool.
//!
//! Fetches the token registry, then for one symbol compares the amount locked
//! on its source chain with the amounts minted on every destination chain.
//!
//! ```bash
//! bridge_audit symbols --source-chain eth
//! bridge_audit reconcile --symbol USDC --json
//! ```

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use bridge_audit::{
    fetch_registry, init_logging, AuditConfig, DecimalCache, LogFormat, QueryOutcome,
    Reconciler, ReconciliationResult, RegistryTable,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(name = "bridge_audit")]
#[command(version, about = "Cross-chain bridge supply reconciliation", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "bridge_audit.toml")]
    config: String,

    /// Override registry CSV URL
    #[arg(long, env = "BRIDGE_AUDIT_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every source chain in the registry
    Chains,
    /// List registry symbols
    Symbols {
        /// Only symbols bridged from this chain
        #[arg(long)]
        source_chain: Option<String>,
    },
    /// Reconcile locked and minted amounts for one symbol
    Reconcile {
        #[arg(short, long)]
        symbol: String,
    },
    /// Generate a sample config file
    GenerateConfig {
        /// Output file path
        #[arg(short, long, default_value = "bridge_audit.toml")]
        output: String,
    },
    /// Validate config without running
    ValidateConfig,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::GenerateConfig { output } => {
            generate_sample_config(output)?;
            return Ok(());
        }
        Commands::ValidateConfig => {
            let config = load_config(&cli)?;
            println!("Configuration is valid:\n{:#?}", config);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let _guards = init_logging(&config.logging, None)?;

    let client = reqwest::Client::new();
    let table = fetch_registry(&client, &config.registry.url).await;
    info!(
        url = %config.registry.url,
        rows = table.rows().len(),
        "Registry loaded"
    );

    match &cli.command {
        Commands::Chains => {
            let chains: Vec<String> = table.source_chain_identifiers().into_iter().collect();
            print_list(&chains, cli.json)?;
        }
        Commands::Symbols { source_chain } => {
            print_list(&table.symbols(source_chain.as_deref()), cli.json)?;
        }
        Commands::Reconcile { symbol } => {
            let reconciler = Reconciler::from_config(&config, client, Arc::new(DecimalCache::new()));
            let result = reconcile(&reconciler, &table, symbol).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::GenerateConfig { .. } | Commands::ValidateConfig => {}
    }
    Ok(())
}

async fn reconcile(
    reconciler: &Reconciler,
    table: &RegistryTable,
    symbol: &str,
) -> ReconciliationResult {
    if table.rows_for_symbol(symbol).next().is_none() {
        info!(symbol = %symbol, "Symbol not listed in registry");
    }
    reconciler.reconcile(table, symbol).await
}

/// Config file, then CLI overrides.
fn load_config(cli: &Cli) -> Result<AuditConfig, Box<dyn std::error::Error>> {
    let mut config = AuditConfig::load(&cli.config)?;
    if let Some(url) = &cli.registry_url {
        config.registry.url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.parse::<LogFormat>()?;
    }
    config.validate()?;
    Ok(config)
}

fn generate_sample_config(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = AuditConfig::default().to_toml()?;
    let with_comments = format!(
        r#"# Bridge Audit Configuration
# See: bridge_audit --help

{}
# Chains absent from [chains] report zero for every query.
# Add a bridge custody account under [holders] to read locked balances
# on that source chain.
"#,
        content
    );
    std::fs::write(path, with_comments)?;
    println!("Sample config written to: {}", path);
    Ok(())
}

fn print_list(items: &[String], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{item}");
        }
    }
    Ok(())
}

fn print_result(result: &ReconciliationResult) {
    println!("{}", result.symbol);
    for (chain, amount) in &result.amounts {
        let marker = if result.symbol_source_chains.contains(chain) {
            " (source)"
        } else {
            ""
        };
        println!("  {:<12} {:>24.6}{}", chain, amount, marker);
    }
    println!("  {:<12} {:>24.6}", "total", result.total);

    let failed: Vec<_> = result.failed_queries().collect();
    if failed.is_empty() {
        return;
    }
    println!();
    println!("Amounts reported as zero for lack of data:");
    for record in failed {
        let reason = match &record.outcome {
            QueryOutcome::Unsupported => "unsupported chain".to_string(),
            QueryOutcome::MissingHolder => "no holder account configured".to_string(),
            QueryOutcome::TimedOut => "timed out".to_string(),
            QueryOutcome::Failed { attempts, reason } => {
                format!("failed after {attempts} attempt(s): {reason}")
            }
            QueryOutcome::Ok => continue,
        };
        println!("  {:<12} {}  {}", record.query.chain_id, record.query.address, reason);
    }
}
