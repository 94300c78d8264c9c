use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{scale_units, AdapterKind, ChainAdapter};
use crate::cache::DecimalCache;
use crate::logging::targets;
use crate::rpc::RpcClient;
use crate::{prelude::*, Error};

sol! {
    interface IERC20 {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// ERC-20 reads against one EVM chain's JSON-RPC endpoint.
#[derive(Debug)]
pub struct EvmAdapter {
    chain_id: String,
    rpc: RpcClient,
    cache: Arc<DecimalCache>,
}

impl EvmAdapter {
    pub fn new(chain_id: impl Into<String>, rpc: RpcClient, cache: Arc<DecimalCache>) -> Self {
        Self {
            chain_id: chain_id.into(),
            rpc,
            cache,
        }
    }

    fn parse_address(&self, address: &str) -> Result<Address> {
        address.trim().parse().map_err(|_| Error::InvalidAddress {
            chain: self.chain_id.clone(),
            address: address.to_string(),
        })
    }

    async fn eth_call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes> {
        let params = json!([{ "to": to, "data": Bytes::from(calldata) }, "latest"]);
        self.rpc.call("eth_call", params).await
    }

    async fn decimals(&self, token: Address, address: &str) -> Result<u8> {
        let data = self
            .eth_call(token, IERC20::decimalsCall {}.abi_encode())
            .await?;
        let decimals = decode_decimals(&data)?;
        self.cache.put(&self.chain_id, address, decimals);
        Ok(decimals)
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Evm
    }

    async fn fetch_supply(&self, address: &str) -> Result<f64> {
        let token = self.parse_address(address)?;
        let decimals = self.decimals(token, address).await?;
        let data = self
            .eth_call(token, IERC20::totalSupplyCall {}.abi_encode())
            .await?;
        let supply = decode_uint_word(&data)?;
        debug!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            token = %address,
            decimals = decimals,
            raw_supply = %supply,
            "EVM total supply"
        );
        scale_units(&supply.to_string(), decimals)
    }

    async fn fetch_holder_balance(&self, address: &str, holder: &str) -> Result<f64> {
        let token = self.parse_address(address)?;
        let account = self.parse_address(holder)?;
        let decimals = self.decimals(token, address).await?;
        let data = self
            .eth_call(token, IERC20::balanceOfCall { account }.abi_encode())
            .await?;
        let balance = decode_uint_word(&data)?;
        debug!(
            target: targets::ADAPTERS,
            chain = %self.chain_id,
            token = %address,
            holder = %holder,
            decimals = decimals,
            raw_balance = %balance,
            "EVM holder balance"
        );
        scale_units(&balance.to_string(), decimals)
    }
}

/// First 32-byte word of `eth_call` return data as an unsigned integer.
pub fn decode_uint_word(data: &[u8]) -> Result<U256> {
    if data.len() < 32 {
        // Calls to an address without code return "0x"
        return Err(Error::abi_decode(format!(
            "expected a 32 byte word, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

pub fn decode_decimals(data: &[u8]) -> Result<u8> {
    let value = decode_uint_word(data)?;
    if value > U256::from(u8::MAX) {
        return Err(Error::abi_decode(format!("decimals out of range: {value}")));
    }
    Ok(value.as_limbs()[0] as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::req::HttpClient;
    use crate::stub_server::StubServer;

    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";
    const HOLDER: &str = "0x3ee18B2214AFF97000D974cf647E7C347E8fa585";

    fn word(value: u64) -> Vec<u8> {
        U256::from(value).to_be_bytes::<32>().to_vec()
    }

    #[test]
    fn test_decode_uint_word() {
        assert_eq!(decode_uint_word(&word(1_000_000)).unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn test_decode_empty_return_is_error() {
        assert!(matches!(decode_uint_word(&[]), Err(Error::AbiDecode(_))));
    }

    #[test]
    fn test_decode_decimals() {
        assert_eq!(decode_decimals(&word(18)).unwrap(), 18);
        assert!(decode_decimals(&word(256)).is_err());
    }

    #[test]
    fn test_decode_rpc_hex_payload() {
        // totalSupply of 2.5 tokens at 6 decimals, as an RPC node returns it
        let body = r#"{"jsonrpc":"2.0","id":7,"result":"0x00000000000000000000000000000000000000000000000000000000002625a0"}"#;
        let data: Bytes = crate::rpc::decode_response(body).unwrap();
        let supply = decode_uint_word(&data).unwrap();
        assert_eq!(scale_units(&supply.to_string(), 6).unwrap(), 2.5);
    }

    #[test]
    fn test_calldata_selectors() {
        assert_eq!(&IERC20::totalSupplyCall {}.abi_encode()[..4], &[0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(&IERC20::decimalsCall {}.abi_encode()[..4], &[0x31, 0x3c, 0xe5, 0x67]);
        let call = IERC20::balanceOfCall {
            account: Address::ZERO,
        }
        .abi_encode();
        assert_eq!(&call[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(call.len(), 36);
    }

    #[tokio::test]
    async fn test_invalid_token_address_fails_before_network() {
        let rpc = RpcClient::new(HttpClient::new(reqwest::Client::new(), "http://127.0.0.1:9"));
        let adapter = EvmAdapter::new("eth", rpc, Arc::new(DecimalCache::new()));
        let err = adapter.fetch_supply("MintB").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
        let err = adapter
            .fetch_holder_balance("0x0000000000000000000000000000000000000001", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    // =========================================================================
    // Against a responding endpoint
    // =========================================================================

    fn word_response(value: u128) -> (u16, String) {
        (
            200,
            format!(r#"{{"jsonrpc":"2.0","id":1,"result":"0x{value:064x}"}}"#),
        )
    }

    fn adapter_for(server: &StubServer, chain: &str, cache: &Arc<DecimalCache>) -> EvmAdapter {
        let rpc = RpcClient::new(HttpClient::new(reqwest::Client::new(), server.url()));
        EvmAdapter::new(chain, rpc, Arc::clone(cache))
    }

    #[tokio::test]
    async fn test_fetch_supply_scales_and_caches_decimals() {
        let server = StubServer::start(vec![word_response(6), word_response(2_500_000)]).await;
        let cache = Arc::new(DecimalCache::new());
        let adapter = adapter_for(&server, "avax", &cache);

        assert_eq!(adapter.fetch_supply(TOKEN).await.unwrap(), 2.5);
        assert_eq!(cache.get("avax", TOKEN), Some(6));

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request["jsonrpc"], "2.0");
            assert_eq!(request["method"], "eth_call");
            assert_eq!(request["params"][1], "latest");
            let to = request["params"][0]["to"].as_str().unwrap().to_lowercase();
            assert_eq!(to, TOKEN);
        }
        assert_eq!(requests[0]["params"][0]["data"], "0x313ce567");
        assert_eq!(requests[1]["params"][0]["data"], "0x18160ddd");
    }

    #[tokio::test]
    async fn test_fetch_holder_balance_encodes_holder() {
        let server = StubServer::start(vec![
            word_response(18),
            word_response(1_234_500_000_000_000_000_000),
        ])
        .await;
        let cache = Arc::new(DecimalCache::new());
        let adapter = adapter_for(&server, "eth", &cache);

        let balance = adapter.fetch_holder_balance(TOKEN, HOLDER).await.unwrap();
        assert_eq!(balance, 1234.5);
        assert_eq!(cache.get("eth", TOKEN), Some(18));

        let requests = server.requests();
        let expected = format!("0x70a08231{:0>64}", HOLDER[2..].to_lowercase());
        assert_eq!(requests[1]["params"][0]["data"], expected.as_str());
    }

    #[tokio::test]
    async fn test_empty_return_data_is_error_without_caching_supply() {
        let server = StubServer::start(vec![(
            200,
            r#"{"jsonrpc":"2.0","id":1,"result":"0x"}"#.to_string(),
        )])
        .await;
        let cache = Arc::new(DecimalCache::new());
        let adapter = adapter_for(&server, "bsc", &cache);

        let err = adapter.fetch_supply(TOKEN).await.unwrap_err();
        assert!(matches!(err, Error::AbiDecode(_)));
        assert_eq!(cache.get("bsc", TOKEN), None);
        assert_eq!(server.request_count(), 1);
    }
}
