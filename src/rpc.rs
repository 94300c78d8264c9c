//! JSON-RPC 2.0 envelope shared by the EVM and Solana adapters.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{prelude::*, req::HttpClient, Error};

#[derive(Serialize, Debug)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize, Debug)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if let Some(err) = self.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or(Error::RpcMissingResult)
    }
}

/// Decode a raw response body into the method's result type.
pub fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let response: JsonRpcResponse<T> =
        serde_json::from_str(body).map_err(|e| Error::json_parse(e.to_string()))?;
    response.into_result()
}

#[derive(Debug)]
pub struct RpcClient {
    http: HttpClient,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let body = serde_json::to_string(&request).map_err(|e| Error::json_parse(e.to_string()))?;
        let text = self.http.post_json(body).await?;
        decode_response(&text)
    }
}
