//! Chain query strategies.
//!
//! - **Evm**: ERC-20 `decimals` / `totalSupply` / `balanceOf` over JSON-RPC `eth_call`
//! - **Solana**: SPL mint supply and token-account balances over Solana JSON-RPC
//! - **Null**: chains with no query path; always zero
//!
//! Adapters return typed errors. Turning those into a zero amount is the
//! dispatcher's job, so every failure is logged exactly once.

use async_trait::async_trait;

use crate::prelude::*;

pub mod evm;
pub mod null;
pub mod solana;

pub use evm::EvmAdapter;
pub use null::NullAdapter;
pub use solana::SolanaAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    Evm,
    Solana,
    Null,
}

/// Uniform query interface over one chain.
///
/// Amounts are in display units (already divided by 10^decimals).
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Total minted supply of the token or mint at `address`.
    async fn fetch_supply(&self, address: &str) -> Result<f64>;

    /// Balance of `holder` in the token or mint at `address`.
    async fn fetch_holder_balance(&self, address: &str, holder: &str) -> Result<f64>;
}

/// Insert a decimal point `decimals` digits from the right of a base-10
/// integer string and read it as a float.
///
/// Going through the decimal string keeps amounts above 2^64 and high
/// precision tokens exact up to the final f64 rounding.
pub fn scale_units(raw: &str, decimals: u8) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(crate::Error::Scaling(format!("not an unsigned integer: '{raw}'")));
    }
    let decimals = decimals as usize;
    let text = if decimals == 0 {
        raw.to_string()
    } else if raw.len() > decimals {
        let (int, frac) = raw.split_at(raw.len() - decimals);
        format!("{int}.{frac}")
    } else {
        format!("0.{}{raw}", "0".repeat(decimals - raw.len()))
    };
    text.parse::<f64>()
        .map_err(|e| crate::Error::Scaling(format!("{text}: {e}")))
}
