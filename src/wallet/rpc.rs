use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{WalletError, WalletProvider};

/// Wallet reachable over JSON-RPC 2.0 (desktop wallets, local signers)
pub struct JsonRpcWallet {
    url: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: Option<u64>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcWallet {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
            request_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, WalletError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(method, id, "Wallet RPC call");
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(WalletError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::Http(status.as_u16()));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Parse(e.to_string()))?;

        if let Some(err) = rpc_response.error {
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| WalletError::Parse("RPC response missing result".to_string()))
    }

    async fn call_accounts(&self, method: &str) -> Result<Vec<String>, WalletError> {
        let result = self.call(method, serde_json::json!([])).await?;
        serde_json::from_value(result)
            .map_err(|e| WalletError::Parse(format!("Failed to parse accounts: {e}")))
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        self.call_accounts("eth_requestAccounts").await
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        self.call_accounts("eth_accounts").await
    }
}
