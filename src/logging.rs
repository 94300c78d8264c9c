//! Structured logging setup.
//!
//! Every degraded query is logged with its chain, address and reason, so the
//! logs are where an RPC outage can be told apart from a genuine zero balance.
//!
//! # Component Targets
//!
//! | Target | Description |
//! |--------|-------------|
//! | `bridge_audit::registry` | Registry fetch and header interpretation |
//! | `bridge_audit::adapters` | Per-chain RPC queries |
//! | `bridge_audit::engine` | Reconciliation planning and aggregation |
//!
//! ```bash
//! RUST_LOG=warn,bridge_audit::adapters=debug bridge_audit reconcile --symbol USDC
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON format (best for log aggregation)
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!(
                "Unknown log format '{other}'. Use: pretty, json, compact"
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Write stdout logs (default: true)
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,

    /// Directory for a daily-rotated JSON log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_enable_stdout() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            enable_stdout: default_enable_stdout(),
            log_dir: None,
        }
    }
}

fn build_filter(
    level: &str,
    env_filter_override: Option<&str>,
) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    if let Some(filter) = env_filter_override {
        return Ok(EnvFilter::try_new(filter)?);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(level)?
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Initialize logging based on configuration.
///
/// Returns the `WorkerGuard`s of any file writers; keep them alive for the
/// duration of the program or buffered lines are lost.
pub fn init_logging(
    config: &LogConfig,
    env_filter_override: Option<&str>,
) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error>> {
    let mut guards = Vec::new();

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "bridge-audit.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            let filter = build_filter(&config.level, env_filter_override)?;
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .json()
                    .with_filter(filter),
            )
        }
        None => None,
    };

    let stdout_layer = if config.enable_stdout {
        let filter = build_filter(&config.level, env_filter_override)?;
        let layer = match config.format {
            LogFormat::Json => fmt::layer().json().with_filter(filter).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_filter(filter).boxed(),
            LogFormat::Pretty => fmt::layer().with_target(false).with_filter(filter).boxed(),
        };
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(guards)
}

/// Log target constants for component-specific logging.
///
/// ```ignore
/// tracing::warn!(target: targets::ADAPTERS, chain = %chain, "Query failed");
/// ```
pub mod targets {
    /// Registry fetch and header interpretation
    pub const REGISTRY: &str = "bridge_audit::registry";
    /// Per-chain RPC queries
    pub const ADAPTERS: &str = "bridge_audit::adapters";
    /// Reconciliation planning and aggregation
    pub const ENGINE: &str = "bridge_audit::engine";
}
