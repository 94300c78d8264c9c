//! Audit configuration: registry source, per-chain endpoints, bridge holder
//! accounts and query limits.
//!
//! Every field has a serde default, so a partial TOML file (or none at all)
//! yields a working configuration for the public Wormhole registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::consts::{
    DEFAULT_EVM_ENDPOINTS, DEFAULT_HOLDERS, DEFAULT_REGISTRY_URL, SOLANA_MAINNET_URL,
};
use crate::logging::LogConfig;
use crate::retry::RetryPolicy;
use crate::{prelude::*, Error};

/// Query protocol family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    Evm,
    Solana,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainEndpoint {
    pub kind: ChainKind,
    pub url: String,
}

impl ChainEndpoint {
    pub fn evm(url: impl Into<String>) -> Self {
        Self {
            kind: ChainKind::Evm,
            url: url.into(),
        }
    }

    pub fn solana(url: impl Into<String>) -> Self {
        Self {
            kind: ChainKind::Solana,
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
        }
    }
}

/// Limits applied to every chain query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryConfig {
    /// In-flight queries allowed per RPC endpoint
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency_per_endpoint: usize,
    /// Deadline for one RPC attempt, not counting the wait for an endpoint
    /// slot. Expired attempts are retried; a query whose last attempt
    /// expires counts as 0
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Attempts per query, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_query_timeout_ms() -> u64 {
    15_000
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_concurrency_per_endpoint: default_max_concurrency(),
            query_timeout_ms: default_query_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay_ms, self.max_delay_ms, 0.2)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Chain identifier -> RPC endpoint. Chains missing here are unsupported.
    #[serde(default = "default_chains")]
    pub chains: BTreeMap<String, ChainEndpoint>,
    /// Source chain identifier -> bridge custody account on that chain.
    #[serde(default = "default_holders")]
    pub holders: BTreeMap<String, String>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

fn default_chains() -> BTreeMap<String, ChainEndpoint> {
    let mut chains: BTreeMap<String, ChainEndpoint> = DEFAULT_EVM_ENDPOINTS
        .iter()
        .map(|(chain, url)| (chain.to_string(), ChainEndpoint::evm(*url)))
        .collect();
    chains.insert("sol".to_string(), ChainEndpoint::solana(SOLANA_MAINNET_URL));
    chains
}

fn default_holders() -> BTreeMap<String, String> {
    DEFAULT_HOLDERS
        .iter()
        .map(|(chain, account)| (chain.to_string(), account.to_string()))
        .collect()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            chains: default_chains(),
            holders: default_holders(),
            query: QueryConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load from a TOML file, or defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.registry.url)
            .map_err(|e| Error::config(format!("registry.url: {e}")))?;
        for (chain, endpoint) in &self.chains {
            url::Url::parse(&endpoint.url)
                .map_err(|e| Error::config(format!("chains.{chain}.url: {e}")))?;
        }
        for (chain, account) in &self.holders {
            if account.trim().is_empty() {
                return Err(Error::config(format!("holders.{chain} is empty")));
            }
        }
        if self.query.max_concurrency_per_endpoint == 0 {
            return Err(Error::config("query.max_concurrency_per_endpoint must be > 0"));
        }
        if self.query.query_timeout_ms == 0 {
            return Err(Error::config("query.query_timeout_ms must be > 0"));
        }
        if self.query.max_attempts == 0 {
            return Err(Error::config("query.max_attempts must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_original_chains() {
        let config = AuditConfig::default();
        for chain in ["eth", "avax", "ftm", "matic", "oasis", "bsc", "aurora", "celo", "moonbeam"] {
            assert_eq!(config.chains[chain].kind, ChainKind::Evm, "{chain}");
        }
        assert_eq!(config.chains["sol"].kind, ChainKind::Solana);
        assert!(!config.chains.contains_key("terra"));
        assert_eq!(
            config.holders["eth"],
            "0x3ee18B2214AFF97000D974cf647E7C347E8fa585"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AuditConfig::from_toml(
            r#"
            [query]
            query_timeout_ms = 500

            [holders]
            bsc = "0x0000000000000000000000000000000000000001"
            "#,
        )
        .unwrap();
        assert_eq!(config.query.query_timeout_ms, 500);
        assert_eq!(config.query.max_concurrency_per_endpoint, 4);
        assert_eq!(config.registry.url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.chains.len(), 10);
        // A [holders] table replaces the default set
        assert!(!config.holders.contains_key("eth"));
        assert!(config.holders.contains_key("bsc"));
    }

    #[test]
    fn test_chain_table_parses() {
        let config = AuditConfig::from_toml(
            r#"
            [chains.eth]
            kind = "evm"
            url = "http://localhost:8545"

            [chains.sol]
            kind = "solana"
            url = "http://localhost:8899"
            "#,
        )
        .unwrap();
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains["eth"], ChainEndpoint::evm("http://localhost:8545"));
        assert_eq!(config.chains["sol"].kind, ChainKind::Solana);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AuditConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AuditConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AuditConfig::default();
        config.chains.insert("bad".into(), ChainEndpoint::evm("not a url"));
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.query.max_concurrency_per_endpoint = 0;
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.holders.insert("sol".into(), "  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = AuditConfig::load("/nonexistent/bridge_audit.toml").unwrap();
        assert_eq!(config, AuditConfig::default());
    }

    #[test]
    fn test_unknown_chain_kind_is_error() {
        let result = AuditConfig::from_toml(
            r#"
            [chains.near]
            kind = "near"
            url = "https://rpc.mainnet.near.org"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
