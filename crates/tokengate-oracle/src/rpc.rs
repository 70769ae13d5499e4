//! Minimal EVM JSON-RPC client
//!
//! Only what the ownership oracle needs: a bounded `POST` per call and
//! `eth_call` against the latest block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokengate_common::{AccountAddress, OracleError};
use tracing::debug;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 client over HTTP
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC call and return its `result`
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, OracleError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "sending JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Unreachable(format!(
                "node answered HTTP {}",
                status
            )));
        }

        let body: RpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                OracleError::ContractError(format!(
                    "malformed JSON-RPC response: {}",
                    e.without_url()
                ))
            }
        })?;

        if let Some(err) = body.error {
            return Err(OracleError::ContractError(format!(
                "{} (code {})",
                err.message, err.code
            )));
        }

        body.result.ok_or_else(|| {
            OracleError::ContractError("response carried neither result nor error".to_string())
        })
    }

    /// Read-only contract call at the latest block; returns the raw return data
    pub async fn eth_call(&self, to: &AccountAddress, data: &[u8]) -> Result<Vec<u8>, OracleError> {
        let params = serde_json::json!([
            {
                "to": to.to_checksum(),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);

        let result = self.call("eth_call", params).await?;
        let encoded = result.as_str().ok_or_else(|| {
            OracleError::ContractError(format!("eth_call result is not a string: {}", result))
        })?;
        decode_hex_data(encoded)
    }
}

/// Provider URLs often embed API keys, so they are stripped from errors
fn transport_error(err: reqwest::Error) -> OracleError {
    let err = err.without_url();
    if err.is_timeout() {
        OracleError::Unreachable(format!("request timed out: {}", err))
    } else {
        OracleError::Unreachable(err.to_string())
    }
}

fn decode_hex_data(encoded: &str) -> Result<Vec<u8>, OracleError> {
    let body = encoded.strip_prefix("0x").ok_or_else(|| {
        OracleError::ContractError(format!("return data lacks 0x prefix: {}", encoded))
    })?;
    hex::decode(body).map_err(|e| OracleError::ContractError(format!("bad return data: {}", e)))
}
