mod common;

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256};
use arb_bridge_core::{PortError, PortFuture, ProviderPort, Signer, SignerLocator};
use serde_json::Value;

use common::{wallet_account, FakeInjected};

#[test]
fn send_transaction_sets_from_and_delegates() {
    let provider = Arc::new(FakeInjected::on(1));
    let signer = Signer::new(
        Arc::clone(&provider) as Arc<dyn ProviderPort>,
        SignerLocator::Index(0),
    );

    let hash = signer
        .send_transaction(&serde_json::json!({
            "to": "0x000000000000000000000000000000000000CAFE",
            "value": "0x1"
        }))
        .expect("send");
    assert_eq!(hash, B256::repeat_byte(0xab));

    let calls = provider.calls.lock().expect("calls lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "eth_sendTransaction");
    let from = calls[0].1[0]["from"].as_str().expect("from");
    assert_eq!(from.parse::<alloy::primitives::Address>().expect("addr"), wallet_account());
}

#[test]
fn send_transaction_rejects_non_object_payload() {
    let provider: Arc<dyn ProviderPort> = Arc::new(FakeInjected::on(1));
    let signer = Signer::new(provider, SignerLocator::Index(0));
    let err = signer
        .send_transaction(&serde_json::json!(["not", "an", "object"]))
        .expect_err("must fail");
    assert!(matches!(err, PortError::Validation(_)));
}

#[test]
fn sign_message_delegates_to_personal_sign() {
    let provider = Arc::new(FakeInjected::on(1));
    let signer = Signer::new(
        Arc::clone(&provider) as Arc<dyn ProviderPort>,
        SignerLocator::Address(wallet_account()),
    );

    let sig: Bytes = signer.sign_message(b"bridge").expect("sign");
    assert_eq!(sig.len(), 65);

    let calls = provider.calls.lock().expect("calls lock");
    assert_eq!(calls[0].0, "personal_sign");
    assert_eq!(calls[0].1[0], "0x627269646765");
}

#[test]
fn missing_index_is_not_found() {
    let provider: Arc<dyn ProviderPort> = Arc::new(FakeInjected {
        accounts: vec![],
        ..FakeInjected::on(1)
    });
    let signer = Signer::new(provider, SignerLocator::Index(0));
    let err = signer.address().expect_err("no accounts");
    assert!(matches!(err, PortError::NotFound(_)));
}

/// Answers only through the async half of the port, like a browser wallet.
#[derive(Debug)]
struct PromiseOnly(FakeInjected);

impl ProviderPort for PromiseOnly {
    fn kind(&self) -> arb_bridge_core::ProviderKind {
        self.0.kind()
    }

    fn endpoint(&self) -> String {
        self.0.endpoint()
    }

    fn accounts(&self) -> Result<Vec<Address>, PortError> {
        Err(PortError::NotImplemented("sync accounts"))
    }

    fn network_id(&self) -> Result<arb_bridge_core::NetworkId, PortError> {
        Err(PortError::NotImplemented("sync network id"))
    }

    fn request(&self, _method: &str, _params: Value) -> Result<Value, PortError> {
        Err(PortError::NotImplemented("sync request"))
    }

    fn accounts_async(&self) -> PortFuture<'_, Vec<Address>> {
        Box::pin(async move { self.0.accounts() })
    }

    fn request_async<'a>(&'a self, method: &'a str, params: Value) -> PortFuture<'a, Value> {
        Box::pin(async move { self.0.request(method, params) })
    }
}

#[tokio::test]
async fn async_signer_routes_through_async_port() {
    let provider = Arc::new(PromiseOnly(FakeInjected::on(42161)));
    let signer = Signer::new(
        Arc::clone(&provider) as Arc<dyn ProviderPort>,
        SignerLocator::Index(0),
    );

    assert!(signer.address().is_err());
    assert_eq!(signer.address_async().await.expect("address"), wallet_account());

    let hash = signer
        .send_transaction_async(&serde_json::json!({ "value": "0x1" }))
        .await
        .expect("send");
    assert_eq!(hash, B256::repeat_byte(0xab));

    let sig = signer.sign_message_async(b"bridge").await.expect("sign");
    assert_eq!(sig.len(), 65);

    let calls = provider.0.calls.lock().expect("calls lock");
    assert_eq!(calls[0].0, "eth_sendTransaction");
    assert_eq!(calls[0].1[0]["from"], wallet_account().to_string());
    assert_eq!(calls[1].0, "personal_sign");
    assert_eq!(calls[1].1[0], "0x627269646765");
}

#[tokio::test]
async fn async_index_lookup_reports_missing_account() {
    let provider: Arc<dyn ProviderPort> = Arc::new(FakeInjected {
        accounts: vec![],
        ..FakeInjected::on(1)
    });
    let signer = Signer::new(provider, SignerLocator::Index(2));
    let err = signer.address_async().await.expect_err("no accounts");
    assert!(matches!(err, PortError::NotFound(_)));
    assert!(signer.sign_message_async(b"x").await.is_err());
}
