use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ChainRole, NetworkId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    Injected,
    JsonRpc,
}

impl ProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Injected => "Injected wallet",
            ProviderKind::JsonRpc => "JSON-RPC",
        }
    }
}

/// Future returned by the async half of a port. Not `Send`: browser
/// wallets and `fetch` only run on the page's thread.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + 'a>>;

/// A handle onto one chain. Signing and submission stay inside whatever
/// sits behind `request`; this crate only routes calls.
///
/// The `*_async` methods default to the blocking calls. Providers that can
/// only answer asynchronously (the browser wallet, HTTP on wasm) override
/// them.
pub trait ProviderPort: Debug + Send + Sync {
    fn kind(&self) -> ProviderKind;
    fn endpoint(&self) -> String;
    fn accounts(&self) -> Result<Vec<Address>, PortError>;
    fn network_id(&self) -> Result<NetworkId, PortError>;
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;

    fn accounts_async(&self) -> PortFuture<'_, Vec<Address>> {
        Box::pin(std::future::ready(self.accounts()))
    }

    fn network_id_async(&self) -> PortFuture<'_, NetworkId> {
        Box::pin(std::future::ready(self.network_id()))
    }

    fn request_async<'a>(&'a self, method: &'a str, params: Value) -> PortFuture<'a, Value> {
        Box::pin(std::future::ready(self.request(method, params)))
    }
}

/// Decodes an `eth_accounts` / `eth_requestAccounts` result.
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport("accounts result must be array".to_owned()))?;
    arr.iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| PortError::Transport("account must be string".to_owned()))?;
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
    pub value: String,
}

/// The wallet-supplied provider.
pub trait InjectedPort: ProviderPort {
    fn is_available(&self) -> bool;
    /// Asks the wallet to expose its accounts (may prompt the user).
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    fn selected_address(&self) -> Option<Address>;
    /// Idempotent.
    fn register_change_listeners(&self) -> Result<(), PortError>;
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError>;
}

/// Builds the remote half of a bridge configuration.
pub trait RemoteFactory {
    fn connect(&self, role: ChainRole, url: &str) -> Result<Arc<dyn ProviderPort>, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accounts_rejects_garbage() {
        assert!(parse_accounts(&serde_json::json!("0x00")).is_err());
        assert!(parse_accounts(&serde_json::json!([1])).is_err());
        assert!(matches!(
            parse_accounts(&serde_json::json!(["0xnope"])),
            Err(PortError::Validation(_))
        ));
    }
}
