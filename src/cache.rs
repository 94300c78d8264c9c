//! Process-wide memo of token decimal precision.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Decimal precision keyed by `"{chain}_{address}"`.
///
/// Built once at startup and shared as `Arc<DecimalCache>`. Writes to
/// distinct keys from concurrent queries are safe; a repeated write simply
/// overwrites, which is harmless since decimals never change on-chain.
#[derive(Debug, Default)]
pub struct DecimalCache {
    entries: RwLock<HashMap<String, u8>>,
}

impl DecimalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(chain: &str, address: &str) -> String {
        format!("{chain}_{address}")
    }

    pub fn get(&self, chain: &str, address: &str) -> Option<u8> {
        self.entries.read().get(&Self::key(chain, address)).copied()
    }

    pub fn put(&self, chain: &str, address: &str, decimals: u8) {
        self.entries.write().insert(Self::key(chain, address), decimals);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
