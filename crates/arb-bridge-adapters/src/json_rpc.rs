use std::sync::Arc;

use alloy::primitives::Address;
use serde_json::Value;

use arb_bridge_core::{
    parse_accounts, ChainRole, NetworkId, PortError, PortFuture, ProviderKind, ProviderPort,
    RemoteFactory,
};

use crate::BridgeEnvConfig;

/// Provider backed by a remote JSON-RPC node (L1 node or rollup validator).
///
/// The async client serves `*_async` calls on every target (it is `fetch`
/// on wasm). The blocking client only exists natively.
#[derive(Debug, Clone)]
pub struct JsonRpcAdapter {
    role: ChainRole,
    url: String,
    client: reqwest::Client,
    #[cfg(not(target_arch = "wasm32"))]
    blocking: reqwest::blocking::Client,
}

impl JsonRpcAdapter {
    pub fn new(role: ChainRole, url: &str, timeout_ms: u64) -> Result<Self, PortError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| PortError::Validation(format!("invalid {} RPC url {url:?}: {e}", role.label())))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PortError::Validation(format!(
                "unsupported {} RPC url scheme: {}",
                role.label(),
                parsed.scheme()
            )));
        }

        let client = async_client(timeout_ms)?;
        #[cfg(not(target_arch = "wasm32"))]
        let blocking = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build RPC client: {e}")))?;

        Ok(Self {
            role,
            url: url.to_owned(),
            client,
            #[cfg(not(target_arch = "wasm32"))]
            blocking,
        })
    }

    pub fn role(&self) -> ChainRole {
        self.role
    }
}

impl ProviderPort for JsonRpcAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::JsonRpc
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }

    fn accounts(&self) -> Result<Vec<Address>, PortError> {
        let result = self.request("eth_accounts", serde_json::json!([]))?;
        parse_accounts(&result)
    }

    fn network_id(&self) -> Result<NetworkId, PortError> {
        let result = self.request("net_version", serde_json::json!([]))?;
        NetworkId::from_json(&result)
    }

    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            post_json_rpc(&self.blocking, &self.url, method, params)
        }
        #[cfg(target_arch = "wasm32")]
        {
            let _ = (method, params);
            Err(PortError::NotImplemented(
                "blocking JSON-RPC is unavailable on wasm; use request_async",
            ))
        }
    }

    fn accounts_async(&self) -> PortFuture<'_, Vec<Address>> {
        Box::pin(async move {
            let result = self
                .request_async("eth_accounts", serde_json::json!([]))
                .await?;
            parse_accounts(&result)
        })
    }

    fn network_id_async(&self) -> PortFuture<'_, NetworkId> {
        Box::pin(async move {
            let result = self
                .request_async("net_version", serde_json::json!([]))
                .await?;
            NetworkId::from_json(&result)
        })
    }

    fn request_async<'a>(&'a self, method: &'a str, params: Value) -> PortFuture<'a, Value> {
        Box::pin(post_json_rpc_async(&self.client, &self.url, method, params))
    }
}

/// Connects remote handles over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct HttpRemoteFactory {
    pub timeout_ms: u64,
}

impl HttpRemoteFactory {
    pub fn with_config(config: &BridgeEnvConfig) -> Self {
        Self {
            timeout_ms: config.rpc_timeout_ms,
        }
    }
}

impl RemoteFactory for HttpRemoteFactory {
    fn connect(&self, role: ChainRole, url: &str) -> Result<Arc<dyn ProviderPort>, PortError> {
        tracing::debug!(role = role.label(), url, "connecting remote JSON-RPC provider");
        Ok(Arc::new(JsonRpcAdapter::new(role, url, self.timeout_ms)?))
    }
}

pub(crate) fn async_client(timeout_ms: u64) -> Result<reqwest::Client, PortError> {
    let builder = reqwest::Client::builder();
    // The browser owns request timeouts on wasm.
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.timeout(std::time::Duration::from_millis(timeout_ms));
    #[cfg(target_arch = "wasm32")]
    let _ = timeout_ms;
    builder
        .build()
        .map_err(|e| PortError::Transport(format!("failed to build RPC client: {e}")))
}

fn rpc_payload(method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

fn rpc_result(method: &str, status: reqwest::StatusCode, body: Value) -> Result<Value, PortError> {
    if !status.is_success() {
        return Err(PortError::Transport(format!(
            "{method} status {status}: {body}"
        )));
    }
    if let Some(err) = body.get("error") {
        return Err(PortError::Transport(format!("{method} returned error: {err}")));
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| PortError::Transport(format!("{method} response missing result")))
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn post_json_rpc(
    client: &reqwest::blocking::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value, PortError> {
    let response = client
        .post(url)
        .json(&rpc_payload(method, params))
        .send()
        .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
    rpc_result(method, status, body)
}

pub(crate) async fn post_json_rpc_async(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value, PortError> {
    let response = client
        .post(url)
        .json(&rpc_payload(method, params))
        .send()
        .await
        .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
    rpc_result(method, status, body)
}
