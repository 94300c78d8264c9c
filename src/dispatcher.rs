//! Chain identifier → adapter routing, and the query runner that applies the
//! concurrency limit, deadline, retries and the degrade-to-zero rule.

use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::adapters::{AdapterKind, ChainAdapter, EvmAdapter, NullAdapter, SolanaAdapter};
use crate::cache::DecimalCache;
use crate::config::{AuditConfig, ChainKind, QueryConfig};
use crate::logging::targets;
use crate::req::HttpClient;
use crate::retry::RetryPolicy;
use crate::rpc::RpcClient;
use crate::{prelude::*, Error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryKind {
    /// Minted supply on a destination chain.
    Supply,
    /// Balance locked in the bridge account on the source chain. `None` when
    /// no holder account is configured for the chain.
    HolderBalance { holder: Option<String> },
}

/// One resolved unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainQuery {
    pub chain_id: String,
    pub address: String,
    pub kind: QueryKind,
}

impl ChainQuery {
    pub fn supply(chain_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
            kind: QueryKind::Supply,
        }
    }

    pub fn holder_balance(
        chain_id: impl Into<String>,
        address: impl Into<String>,
        holder: Option<String>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
            kind: QueryKind::HolderBalance { holder },
        }
    }

    pub fn holder_account(&self) -> Option<&str> {
        match &self.kind {
            QueryKind::HolderBalance { holder } => holder.as_deref(),
            QueryKind::Supply => None,
        }
    }
}

/// How a query's amount came about. Only `Ok` is a real on-chain reading;
/// every other outcome carries an amount of 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Ok,
    Unsupported,
    MissingHolder,
    Failed { attempts: usize, reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountRecord {
    pub query: ChainQuery,
    pub adapter: AdapterKind,
    pub amount: f64,
    pub outcome: QueryOutcome,
}

impl AmountRecord {
    fn degraded(query: &ChainQuery, adapter: AdapterKind, outcome: QueryOutcome) -> Self {
        Self {
            query: query.clone(),
            adapter,
            amount: 0.0,
            outcome,
        }
    }

    /// True when the zero amount stands for missing data, not a reading.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.outcome, QueryOutcome::Ok)
    }
}

#[derive(Clone)]
struct Route {
    adapter: Arc<dyn ChainAdapter>,
    limiter: Arc<Semaphore>,
}

/// Maps chain identifiers to adapters. Unknown chains get a [`NullAdapter`].
pub struct AdapterDispatcher {
    routes: HashMap<String, Route>,
    cache: Arc<DecimalCache>,
    max_concurrency: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl AdapterDispatcher {
    pub fn new(cache: Arc<DecimalCache>, query: &QueryConfig) -> Self {
        Self {
            routes: HashMap::new(),
            cache,
            max_concurrency: query.max_concurrency_per_endpoint.max(1),
            timeout: query.timeout(),
            retry: query.retry_policy(),
        }
    }

    /// Build EVM and Solana adapters for every configured chain. Chains that
    /// share an endpoint URL share its concurrency limit.
    pub fn from_config(config: &AuditConfig, client: Client, cache: Arc<DecimalCache>) -> Self {
        let mut dispatcher = Self::new(cache, &config.query);
        let mut limiters: HashMap<&str, Arc<Semaphore>> = HashMap::new();

        for (chain_id, endpoint) in &config.chains {
            let rpc = RpcClient::new(HttpClient::new(client.clone(), endpoint.url.as_str()));
            let adapter: Arc<dyn ChainAdapter> = match endpoint.kind {
                ChainKind::Evm => Arc::new(EvmAdapter::new(
                    chain_id.as_str(),
                    rpc,
                    Arc::clone(&dispatcher.cache),
                )),
                ChainKind::Solana => Arc::new(SolanaAdapter::new(
                    chain_id.as_str(),
                    rpc,
                    Arc::clone(&dispatcher.cache),
                )),
            };
            let limiter = limiters
                .entry(endpoint.url.as_str())
                .or_insert_with(|| Arc::new(Semaphore::new(dispatcher.max_concurrency)))
                .clone();
            dispatcher
                .routes
                .insert(chain_id.clone(), Route { adapter, limiter });
        }
        dispatcher
    }

    /// Route `chain_id` to `adapter`, replacing any existing route.
    pub fn register(&mut self, chain_id: impl Into<String>, adapter: Arc<dyn ChainAdapter>) {
        let limiter = Arc::new(Semaphore::new(self.max_concurrency));
        self.routes.insert(chain_id.into(), Route { adapter, limiter });
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<DecimalCache> {
        &self.cache
    }

    pub fn supported_chains(&self) -> Vec<&str> {
        let mut chains: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        chains.sort_unstable();
        chains
    }

    pub fn resolve(&self, chain_id: &str) -> Arc<dyn ChainAdapter> {
        self.route(chain_id).adapter
    }

    fn route(&self, chain_id: &str) -> Route {
        match self.routes.get(chain_id) {
            Some(route) => route.clone(),
            None => Route {
                adapter: Arc::new(NullAdapter::new(chain_id, Arc::clone(&self.cache))),
                limiter: Arc::new(Semaphore::new(self.max_concurrency)),
            },
        }
    }

    /// Run one query. Never fails: every problem becomes a zero amount with
    /// the reason in the record's outcome and a warning in the log.
    pub async fn query(&self, query: &ChainQuery) -> AmountRecord {
        let route = self.route(&query.chain_id);
        let adapter_kind = route.adapter.kind();

        if let QueryKind::HolderBalance { holder: None } = query.kind {
            warn!(
                target: targets::ADAPTERS,
                chain = %query.chain_id,
                address = %query.address,
                "No bridge holder account configured, reporting zero locked balance"
            );
            return AmountRecord::degraded(query, adapter_kind, QueryOutcome::MissingHolder);
        }

        let (result, attempts) = self
            .retry
            .retry_async(
                |_| attempt(&route, query, self.timeout),
                |e: &Error| e.is_transient(),
            )
            .await;

        match result {
            Ok(amount) if amount.is_finite() => {
                debug!(
                    target: targets::ADAPTERS,
                    chain = %query.chain_id,
                    address = %query.address,
                    amount = amount,
                    attempts = attempts,
                    "Query complete"
                );
                let outcome = if adapter_kind == AdapterKind::Null {
                    QueryOutcome::Unsupported
                } else {
                    QueryOutcome::Ok
                };
                AmountRecord {
                    query: query.clone(),
                    adapter: adapter_kind,
                    amount,
                    outcome,
                }
            }
            Ok(amount) => {
                warn!(
                    target: targets::ADAPTERS,
                    chain = %query.chain_id,
                    address = %query.address,
                    amount = amount,
                    "Query returned a non-finite amount, reporting zero"
                );
                let reason = format!("non-finite amount {amount}");
                AmountRecord::degraded(
                    query,
                    adapter_kind,
                    QueryOutcome::Failed { attempts, reason },
                )
            }
            Err(Error::Timeout { timeout_ms }) => {
                warn!(
                    target: targets::ADAPTERS,
                    chain = %query.chain_id,
                    address = %query.address,
                    attempts = attempts,
                    timeout_ms = timeout_ms,
                    "Query timed out, reporting zero"
                );
                AmountRecord::degraded(query, adapter_kind, QueryOutcome::TimedOut)
            }
            Err(e) => {
                warn!(
                    target: targets::ADAPTERS,
                    chain = %query.chain_id,
                    address = %query.address,
                    attempts = attempts,
                    error = %e,
                    "Query failed, reporting zero"
                );
                AmountRecord::degraded(
                    query,
                    adapter_kind,
                    QueryOutcome::Failed {
                        attempts,
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}

/// One attempt: wait for an endpoint slot, then run the adapter call under
/// `timeout`. Queue time does not count against the deadline, and the slot is
/// released before any retry backoff.
async fn attempt(route: &Route, query: &ChainQuery, timeout: Duration) -> Result<f64> {
    let _permit = route
        .limiter
        .acquire()
        .await
        .map_err(|e| Error::GenericRequest(e.to_string()))?;
    let call = async {
        match query.holder_account() {
            Some(holder) => {
                route
                    .adapter
                    .fetch_holder_balance(&query.address, holder)
                    .await
            }
            None => route.adapter.fetch_supply(&query.address).await,
        }
    };
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })?
}
