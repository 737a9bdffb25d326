mod common;

use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use arb_bridge_adapters::JsonRpcAdapter;
use arb_bridge_core::{ChainRole, NetworkId, PortError, ProviderPort, Signer, SignerLocator};

use common::{block_on, spawn_wallet_node, NODE};

#[test]
fn remote_node_reports_accounts_and_network() {
    let node = spawn_wallet_node(Arc::new(Mutex::new("0xa4b1".to_owned())), vec![NODE]);
    let adapter = JsonRpcAdapter::new(ChainRole::L2, &node.url, 5_000).expect("adapter");

    assert_eq!(adapter.role(), ChainRole::L2);
    assert_eq!(adapter.network_id().expect("network"), NetworkId(42161));
    assert_eq!(
        adapter.accounts().expect("accounts"),
        vec![NODE.parse::<Address>().expect("node")]
    );
    assert_eq!(
        adapter
            .request("eth_blockNumber", serde_json::json!([]))
            .expect("block number"),
        serde_json::json!("0x10")
    );

    let calls = node.calls.lock().expect("calls lock");
    assert_eq!(
        calls.as_slice(),
        &["net_version".to_owned(), "eth_accounts".to_owned(), "eth_blockNumber".to_owned()]
    );
}

#[test]
fn json_rpc_error_objects_become_transport_errors() {
    let node = spawn_wallet_node(Arc::new(Mutex::new("1".to_owned())), vec![]);
    let adapter = JsonRpcAdapter::new(ChainRole::L1, &node.url, 5_000).expect("adapter");
    let err = adapter
        .request("eth_sendTransaction", serde_json::json!([{}]))
        .expect_err("must fail");
    assert!(matches!(err, PortError::Transport(ref msg) if msg.contains("-32601")));
}

#[test]
fn unreachable_node_is_a_transport_error() {
    // Port 9 (discard) is not expected to serve HTTP.
    let adapter = JsonRpcAdapter::new(ChainRole::L1, "http://127.0.0.1:9", 500).expect("adapter");
    let err = adapter.network_id().expect_err("unreachable");
    assert!(matches!(err, PortError::Transport(_)));
}

#[test]
fn async_calls_reach_the_node_without_blocking_client() {
    let node = spawn_wallet_node(Arc::new(Mutex::new("42161".to_owned())), vec![NODE]);
    let adapter = JsonRpcAdapter::new(ChainRole::L2, &node.url, 5_000).expect("adapter");
    let signer = Signer::new(
        Arc::new(adapter.clone()) as Arc<dyn ProviderPort>,
        SignerLocator::Index(0),
    );

    block_on(async {
        assert_eq!(adapter.network_id_async().await.expect("network"), NetworkId(42161));
        assert_eq!(
            signer.address_async().await.expect("signer"),
            NODE.parse::<Address>().expect("node")
        );
        let block = adapter
            .request_async("eth_blockNumber", serde_json::json!([]))
            .await
            .expect("block number");
        assert_eq!(block, serde_json::json!("0x10"));

        let err = signer
            .sign_message_async(b"bridge")
            .await
            .expect_err("node does not sign");
        assert!(matches!(err, PortError::Transport(ref msg) if msg.contains("-32601")));
    });

    let calls = node.calls.lock().expect("calls lock");
    assert_eq!(
        calls.as_slice(),
        &[
            "net_version".to_owned(),
            "eth_accounts".to_owned(),
            "eth_blockNumber".to_owned(),
            "eth_accounts".to_owned(),
            "personal_sign".to_owned(),
        ]
    );
}
