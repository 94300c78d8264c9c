//! Cross-chain reconciliation.
//!
//! For one symbol, every non-empty address cell of every matching registry
//! row becomes a [`ChainQuery`]. The queries run concurrently, and their
//! results are folded back in (row, column) order so that a later column
//! overwrites an earlier one for the same chain, exactly as a sequential walk
//! would.

use futures_util::future::join_all;
use indexmap::{IndexMap, IndexSet};
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::DecimalCache;
use crate::config::AuditConfig;
use crate::consts::TOTAL_KEY;
use crate::dispatcher::{AdapterDispatcher, AmountRecord, ChainQuery};
use crate::logging::targets;
use crate::registry::{RegistryTable, SOURCE_CHAIN_COLUMN, SYMBOL_COLUMN};

/// A query together with where it came from in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub row: usize,
    pub column: usize,
    /// Key the result is stored under.
    pub chain_id: String,
    /// Written through the `sourceAddress` column.
    pub is_source: bool,
    pub query: ChainQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub queries: Vec<PlannedQuery>,
    /// Every source chain in the registry, regardless of symbol.
    pub source_chains: IndexSet<String>,
    /// Source chains of the rows listing the symbol.
    pub symbol_source_chains: IndexSet<String>,
}

/// Locked vs minted amounts for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub symbol: String,
    /// Chain identifier → amount in display units, first write order.
    pub amounts: IndexMap<String, f64>,
    /// Sum of `amounts` without the symbol's own source chains.
    pub total: f64,
    pub source_chains: Vec<String>,
    pub symbol_source_chains: Vec<String>,
    /// One record per query, in plan order.
    pub records: Vec<AmountRecord>,
}

impl ReconciliationResult {
    /// `amounts` plus the synthetic `"total"` entry.
    pub fn amounts_with_total(&self) -> IndexMap<String, f64> {
        let mut amounts = self.amounts.clone();
        amounts.insert(TOTAL_KEY.to_string(), self.total);
        amounts
    }

    /// Records whose zero stands for missing data.
    pub fn failed_queries(&self) -> impl Iterator<Item = &AmountRecord> {
        self.records.iter().filter(|record| record.is_degraded())
    }

    pub fn into_parts(self) -> (IndexMap<String, f64>, f64, Vec<String>) {
        (self.amounts, self.total, self.source_chains)
    }
}

/// Sum of every amount whose key is not one of `excluded`.
///
/// Chains with no entry contribute nothing, and failed queries are stored as
/// 0, so the two are indistinguishable here.
pub fn total_excluding(amounts: &IndexMap<String, f64>, excluded: &IndexSet<String>) -> f64 {
    amounts
        .iter()
        .filter(|(chain, _)| !excluded.contains(chain.as_str()))
        .map(|(_, amount)| *amount)
        .sum()
}

/// Turn the registry rows for `symbol` into queries.
///
/// Pure: no network, no logging beyond header warnings.
pub fn plan(
    table: &RegistryTable,
    symbol: &str,
    holders: &BTreeMap<String, String>,
) -> ReconciliationPlan {
    let columns = table.address_columns();
    let mut plan = ReconciliationPlan {
        queries: Vec::new(),
        source_chains: table.source_chain_identifiers(),
        symbol_source_chains: table.symbol_source_chain(symbol),
    };

    for (offset, row) in table.data_rows().iter().enumerate() {
        if RegistryTable::cell(row, SYMBOL_COLUMN) != symbol {
            continue;
        }
        let row_index = offset + 1;
        let source_chain = RegistryTable::cell(row, SOURCE_CHAIN_COLUMN);

        for column in &columns {
            let address = RegistryTable::cell(row, column.index).trim();
            if address.is_empty() {
                continue;
            }
            let target = column.resolve(source_chain);
            if target.chain_id.is_empty() {
                warn!(
                    target: targets::ENGINE,
                    row = row_index,
                    column = %column.header,
                    "Address cell has no chain to query, skipping"
                );
                continue;
            }
            let query = if target.is_source {
                ChainQuery::holder_balance(
                    target.chain_id.as_str(),
                    address,
                    holders.get(&target.chain_id).cloned(),
                )
            } else {
                ChainQuery::supply(target.chain_id.as_str(), address)
            };
            plan.queries.push(PlannedQuery {
                row: row_index,
                column: column.index,
                chain_id: target.chain_id,
                is_source: target.is_source,
                query,
            });
        }
    }
    plan
}

/// The reconciliation engine. Holds no state between calls besides the
/// adapters' shared decimal cache.
pub struct Reconciler {
    dispatcher: AdapterDispatcher,
    holders: BTreeMap<String, String>,
}

impl Reconciler {
    pub fn new(dispatcher: AdapterDispatcher, holders: BTreeMap<String, String>) -> Self {
        Self { dispatcher, holders }
    }

    pub fn from_config(config: &AuditConfig, client: Client, cache: Arc<DecimalCache>) -> Self {
        Self::new(
            AdapterDispatcher::from_config(config, client, cache),
            config.holders.clone(),
        )
    }

    pub fn dispatcher(&self) -> &AdapterDispatcher {
        &self.dispatcher
    }

    pub fn plan(&self, table: &RegistryTable, symbol: &str) -> ReconciliationPlan {
        plan(table, symbol, &self.holders)
    }

    /// Parse `registry_text` and reconcile `symbol`.
    pub async fn reconcile_text(&self, registry_text: &str, symbol: &str) -> ReconciliationResult {
        self.reconcile(&RegistryTable::parse(registry_text), symbol).await
    }

    pub async fn reconcile(&self, table: &RegistryTable, symbol: &str) -> ReconciliationResult {
        let plan = self.plan(table, symbol);

        let records = join_all(
            plan.queries
                .iter()
                .map(|planned| self.dispatcher.query(&planned.query)),
        )
        .await;

        let mut amounts = IndexMap::new();
        for (planned, record) in plan.queries.iter().zip(&records) {
            amounts.insert(planned.chain_id.clone(), record.amount);
        }
        let total = total_excluding(&amounts, &plan.symbol_source_chains);

        let degraded = records.iter().filter(|r| r.is_degraded()).count();
        info!(
            target: targets::ENGINE,
            symbol = %symbol,
            queries = records.len(),
            degraded = degraded,
            chains = amounts.len(),
            total = total,
            "Reconciliation complete"
        );
        if degraded > 0 {
            warn!(
                target: targets::ENGINE,
                symbol = %symbol,
                degraded = degraded,
                "Some amounts are zero for lack of data, not on-chain zero"
            );
        }

        ReconciliationResult {
            symbol: symbol.to_string(),
            amounts,
            total,
            source_chains: plan.source_chains.into_iter().collect(),
            symbol_source_chains: plan.symbol_source_chains.into_iter().collect(),
            records,
        }
    }
}
