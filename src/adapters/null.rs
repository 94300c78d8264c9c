use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::{AdapterKind, ChainAdapter};
use crate::cache::DecimalCache;
use crate::consts::KNOWN_NATIVE_DECIMALS;
use crate::logging::targets;
use crate::prelude::*;

/// Stand-in for chains without a query path. Always reports zero.
#[derive(Debug)]
pub struct NullAdapter {
    chain_id: String,
    cache: Arc<DecimalCache>,
}

impl NullAdapter {
    pub fn new(chain_id: impl Into<String>, cache: Arc<DecimalCache>) -> Self {
        Self {
            chain_id: chain_id.into(),
            cache,
        }
    }

    /// Terra-style native denominations have a fixed precision. Recorded
    /// under this adapter's own chain id.
    fn remember_native_decimals(&self, address: &str) {
        if !matches!(self.chain_id.as_str(), "terra" | "aptos") {
            return;
        }
        if self.cache.get(&self.chain_id, address).is_some() {
            return;
        }
        if let Some((_, decimals)) = KNOWN_NATIVE_DECIMALS
            .iter()
            .find(|(denom, _)| *denom == address)
        {
            self.cache.put(&self.chain_id, address, *decimals);
        }
    }
}

#[async_trait]
impl ChainAdapter for NullAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Null
    }

    async fn fetch_supply(&self, address: &str) -> Result<f64> {
        self.remember_native_decimals(address);
        warn!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            address = %address,
            "Unsupported chain, reporting zero supply"
        );
        Ok(0.0)
    }

    async fn fetch_holder_balance(&self, address: &str, holder: &str) -> Result<f64> {
        self.remember_native_decimals(address);
        warn!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            address = %address,
            holder = %holder,
            "Unsupported chain, reporting zero balance"
        );
        Ok(0.0)
    }
}
