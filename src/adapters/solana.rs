use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{scale_units, AdapterKind, ChainAdapter};
use crate::cache::DecimalCache;
use crate::consts::{SPL_TOKEN_ACCOUNT_SIZE, SPL_TOKEN_OWNER_OFFSET, SPL_TOKEN_PROGRAM_ID};
use crate::logging::targets;
use crate::rpc::RpcClient;
use crate::{prelude::*, Error};

#[derive(Deserialize, Debug)]
pub struct RpcContextValue<T> {
    pub value: T,
}

/// Token amount as the cluster reports it, raw and pre-scaled.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    /// The cluster's display amount; raw scaling only if it sent none.
    pub fn ui_value(&self) -> Result<f64> {
        if let Some(text) = &self.ui_amount_string {
            return text
                .parse::<f64>()
                .map_err(|e| Error::Scaling(format!("{text}: {e}")));
        }
        match self.ui_amount {
            Some(value) => Ok(value),
            None => scale_units(&self.amount, self.decimals),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    pub token_amount: UiTokenAmount,
}

#[derive(Deserialize, Debug)]
pub struct ParsedTokenAccount {
    pub info: TokenAccountInfo,
}

#[derive(Deserialize, Debug)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenAccount,
}

#[derive(Deserialize, Debug)]
pub struct AccountData {
    pub data: ParsedAccountData,
}

#[derive(Deserialize, Debug)]
pub struct KeyedTokenAccount {
    pub pubkey: String,
    pub account: AccountData,
}

/// First token account holding `mint`.
pub fn select_mint_account<'a>(
    accounts: &'a [KeyedTokenAccount],
    mint: &str,
) -> Option<&'a KeyedTokenAccount> {
    accounts
        .iter()
        .find(|keyed| keyed.account.data.parsed.info.mint == mint)
}

/// SPL token reads against a Solana cluster.
#[derive(Debug)]
pub struct SolanaAdapter {
    chain_id: String,
    rpc: RpcClient,
    cache: Arc<DecimalCache>,
}

impl SolanaAdapter {
    pub fn new(chain_id: impl Into<String>, rpc: RpcClient, cache: Arc<DecimalCache>) -> Self {
        Self {
            chain_id: chain_id.into(),
            rpc,
            cache,
        }
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Solana
    }

    async fn fetch_supply(&self, address: &str) -> Result<f64> {
        let mint = address.trim();
        let supply: RpcContextValue<UiTokenAmount> = self
            .rpc
            .call("getTokenSupply", json!([mint, { "commitment": "confirmed" }]))
            .await?;
        self.cache.put(&self.chain_id, address, supply.value.decimals);
        debug!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            mint = %mint,
            decimals = supply.value.decimals,
            raw_supply = %supply.value.amount,
            "SPL mint supply"
        );
        supply.value.ui_value()
    }

    async fn fetch_holder_balance(&self, address: &str, holder: &str) -> Result<f64> {
        let mint = address.trim();
        let params = json!([
            SPL_TOKEN_PROGRAM_ID,
            {
                "encoding": "jsonParsed",
                "commitment": "confirmed",
                "filters": [
                    { "dataSize": SPL_TOKEN_ACCOUNT_SIZE },
                    { "memcmp": { "offset": SPL_TOKEN_OWNER_OFFSET, "bytes": holder.trim() } }
                ]
            }
        ]);
        let accounts: Vec<KeyedTokenAccount> = self.rpc.call("getProgramAccounts", params).await?;

        let Some(keyed) = select_mint_account(&accounts, mint) else {
            debug!(
                target: targets::ADAPTERS,
                chain = %self.chain_id,
                mint = %mint,
                holder = %holder,
                scanned = accounts.len(),
                "No token account for mint"
            );
            return Ok(0.0);
        };

        let amount = &keyed.account.data.parsed.info.token_amount;
        self.cache.put(&self.chain_id, address, amount.decimals);
        debug!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            mint = %mint,
            holder = %holder,
            token_account = %keyed.pubkey,
            raw_balance = %amount.amount,
            "SPL holder balance"
        );
        amount.ui_value()
    }
}
