use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256};
use serde_json::{Map, Value};

use crate::ports::{PortError, ProviderPort};

/// How a signer picks its account on the backing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerLocator {
    Index(usize),
    Address(Address),
}

impl SignerLocator {
    /// Unknown selection falls back to the provider's first account.
    pub fn from_selected(selected: Option<Address>) -> Self {
        selected.map_or(SignerLocator::Index(0), SignerLocator::Address)
    }
}

/// An account on a provider that can authorize transactions.
///
/// The provider does the actual signing: the injected wallet prompts the
/// user, a remote node signs with an unlocked account.
#[derive(Debug, Clone)]
pub struct Signer {
    provider: Arc<dyn ProviderPort>,
    locator: SignerLocator,
}

impl Signer {
    pub fn new(provider: Arc<dyn ProviderPort>, locator: SignerLocator) -> Self {
        Self { provider, locator }
    }

    pub fn locator(&self) -> SignerLocator {
        self.locator
    }

    pub fn address(&self) -> Result<Address, PortError> {
        match self.locator {
            SignerLocator::Address(address) => Ok(address),
            SignerLocator::Index(index) => self.account_at(&self.provider.accounts()?, index),
        }
    }

    pub fn send_transaction(&self, tx: &Value) -> Result<B256, PortError> {
        let mut tx = transaction_object(tx)?;
        tx.insert("from".to_owned(), Value::String(self.address()?.to_string()));
        let result = self
            .provider
            .request("eth_sendTransaction", serde_json::json!([tx]))?;
        parse_tx_hash(&result)
    }

    pub fn sign_message(&self, message: &[u8]) -> Result<Bytes, PortError> {
        let params = personal_sign_params(message, self.address()?);
        let result = self.provider.request("personal_sign", params)?;
        parse_signature(&result)
    }

    pub async fn address_async(&self) -> Result<Address, PortError> {
        match self.locator {
            SignerLocator::Address(address) => Ok(address),
            SignerLocator::Index(index) => {
                let accounts = self.provider.accounts_async().await?;
                self.account_at(&accounts, index)
            }
        }
    }

    pub async fn send_transaction_async(&self, tx: &Value) -> Result<B256, PortError> {
        let mut tx = transaction_object(tx)?;
        let from = self.address_async().await?;
        tx.insert("from".to_owned(), Value::String(from.to_string()));
        let result = self
            .provider
            .request_async("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        parse_tx_hash(&result)
    }

    pub async fn sign_message_async(&self, message: &[u8]) -> Result<Bytes, PortError> {
        let params = personal_sign_params(message, self.address_async().await?);
        let result = self.provider.request_async("personal_sign", params).await?;
        parse_signature(&result)
    }

    fn account_at(&self, accounts: &[Address], index: usize) -> Result<Address, PortError> {
        accounts.get(index).copied().ok_or_else(|| {
            PortError::NotFound(format!(
                "no account at index {index} on {} ({} available)",
                self.provider.endpoint(),
                accounts.len()
            ))
        })
    }
}

fn transaction_object(tx: &Value) -> Result<Map<String, Value>, PortError> {
    tx.as_object()
        .cloned()
        .ok_or_else(|| PortError::Validation("transaction must be a JSON object".to_owned()))
}

fn personal_sign_params(message: &[u8], from: Address) -> Value {
    let payload_hex = format!("0x{}", alloy::hex::encode(message));
    serde_json::json!([payload_hex, from.to_string()])
}

fn parse_tx_hash(result: &Value) -> Result<B256, PortError> {
    let hash = result.as_str().ok_or_else(|| {
        PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
    })?;
    hash.parse()
        .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
}

fn parse_signature(result: &Value) -> Result<Bytes, PortError> {
    let sig_raw = result
        .as_str()
        .ok_or_else(|| PortError::Transport("personal_sign must return hex string".to_owned()))?;
    sig_raw
        .parse()
        .map_err(|e| PortError::Validation(format!("invalid signature hex: {e}")))
}
