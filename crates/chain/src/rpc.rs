//! JSON-RPC transport

use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::abi;
use crate::error::ChainError;

/// Ethereum-style JSON-RPC client
///
/// Every call is wrapped in an explicit timeout; the node itself may never
/// answer.
pub struct JsonRpcClient {
    http: HttpClient,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Client whose every call is bounded by `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = HttpClient::builder().build().map_err(ChainError::Transport)?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw JSON-RPC call returning the `result` member
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let request = async {
            let response = self
                .http
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(ChainError::Transport)?
                .error_for_status()
                .map_err(ChainError::Transport)?;
            response.json::<Value>().await.map_err(ChainError::Transport)
        };

        let mut response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ChainError::Timeout(self.timeout.as_millis() as u64))??;

        if let Some(error) = response.get("error") {
            return Err(ChainError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }

        match response.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(ChainError::InvalidResponse(format!(
                "{} response without result",
                method
            ))),
        }
    }

    async fn call_hex(&self, method: &str, params: Value) -> Result<Vec<u8>, ChainError> {
        let result = self.call(method, params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("{} result is not a string", method)))?;
        abi::decode_hex(raw)
    }

    /// `eth_call` of an argument-less view function at the latest block
    pub async fn eth_call(&self, to: &str, signature: &str) -> Result<Vec<u8>, ChainError> {
        abi::validate_address(to)?;
        let tx = json!({ "to": to, "data": abi::calldata(signature) });
        self.call_hex("eth_call", json!([tx, "latest"])).await
    }

    /// Deployed bytecode at an address (empty when destroyed or never deployed)
    pub async fn get_code(&self, address: &str) -> Result<Vec<u8>, ChainError> {
        abi::validate_address(address)?;
        self.call_hex("eth_getCode", json!([address, "latest"])).await
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse("eth_blockNumber result is not a string".to_string()))?;
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        u64::from_str_radix(digits, 16)
            .map_err(|e| ChainError::InvalidResponse(format!("bad block number {}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";

    #[tokio::test]
    async fn test_block_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_blockNumber" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x10d4f"
            })))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.block_number().await.unwrap(), 68943);
    }

    #[tokio::test]
    async fn test_eth_call_sends_selector() {
        let server = MockServer::start().await;
        let supply = format!("0x{}", hex::encode(abi::encode_words(&[1_000_000])));
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_call",
                "params": [{ "to": TOKEN, "data": "0x18160ddd" }, "latest"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": supply
            })))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let data = client.eth_call(TOKEN, abi::TOTAL_SUPPLY).await.unwrap();
        assert_eq!(abi::decode_u128(&data, 0).unwrap(), 1_000_000);
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": { "code": -32000, "message": "execution reverted" }
            })))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let result = client.eth_call(TOKEN, abi::TOTAL_SUPPLY).await;

        assert!(matches!(result, Err(ChainError::Rpc { code: -32000, .. })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x1" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        assert!(matches!(client.block_number().await, Err(ChainError::Timeout(50))));
    }

    #[tokio::test]
    async fn test_invalid_address_never_hits_network() {
        let client = JsonRpcClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let result = client.get_code("not-an-address").await;
        assert!(matches!(result, Err(ChainError::InvalidAddress(_))));
    }
}
