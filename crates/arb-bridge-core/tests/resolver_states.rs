mod common;

use std::sync::Arc;

use arb_bridge_core::{
    needs_reload, BridgeMode, ChainRole, ConnectionState, NetworkId, NetworkSettings,
    ProviderEventKind, ProviderKind, RemoteEndpoints, ResolveError, Resolver, SignerLocator,
};

use common::{node_account, wallet_account, FakeFactory, FakeInjected};

const ETH_ID: u64 = 1;
const ARB_ID: u64 = 42161;

fn resolver() -> Resolver {
    Resolver::new(
        NetworkSettings {
            eth_network_id: Some(NetworkId(ETH_ID)),
            arb_network_id: Some(NetworkId(ARB_ID)),
        },
        RemoteEndpoints {
            eth_node_url: Some("http://l1.node".to_owned()),
            arb_validator_url: Some("http://l2.validator".to_owned()),
        },
    )
}

#[test]
fn missing_provider_resolves_to_no_wallet() {
    let injected = Arc::new(FakeInjected::default());
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::NoWallet);
    assert!(resolution.config().is_none());
    assert_eq!(*injected.listeners_registered.lock().expect("lock"), 0);
}

#[test]
fn unreadable_network_resolves_to_no_wallet() {
    let injected = Arc::new(FakeInjected {
        available: true,
        network: None,
        ..FakeInjected::default()
    });
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::NoWallet);
}

#[test]
fn info_hash_shows_wrong_network_without_touching_provider() {
    let injected = Arc::new(FakeInjected::on(ETH_ID));
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, true)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::WrongNetwork);
    assert!(factory.connected.lock().expect("lock").is_empty());
    assert_eq!(*injected.listeners_registered.lock().expect("lock"), 0);
}

#[test]
fn l1_network_builds_deposit_config() {
    let injected = Arc::new(FakeInjected::on(ETH_ID));
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::DepositMode);
    assert_eq!(resolution.state().mode(), Some(BridgeMode::Deposit));

    let config = resolution.config().expect("deposit config");
    assert_eq!(config.eth_provider.kind(), ProviderKind::Injected);
    assert_eq!(config.arb_provider.kind(), ProviderKind::JsonRpc);
    assert_eq!(config.arb_provider.endpoint(), "http://l2.validator");
    assert_eq!(config.eth_signer.locator(), SignerLocator::Index(0));
    assert_eq!(
        config.arb_signer.locator(),
        SignerLocator::Address(wallet_account())
    );

    let connected = factory.connected.lock().expect("lock");
    assert_eq!(
        connected.as_slice(),
        &[(ChainRole::L2, "http://l2.validator".to_owned())]
    );
    assert_eq!(*injected.listeners_registered.lock().expect("lock"), 1);
}

#[test]
fn rollup_network_builds_withdraw_config() {
    let injected = Arc::new(FakeInjected::on(ARB_ID));
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::WithdrawMode);

    let config = resolution.into_config().expect("withdraw config");
    assert_eq!(config.mode, BridgeMode::Withdraw);
    assert_eq!(config.eth_provider.kind(), ProviderKind::JsonRpc);
    assert_eq!(config.eth_provider.endpoint(), "http://l1.node");
    assert_eq!(config.arb_provider.kind(), ProviderKind::Injected);
    assert_eq!(config.arb_signer.locator(), SignerLocator::Index(0));
    assert_eq!(
        config.signer(ChainRole::L1).address().expect("selected address"),
        wallet_account()
    );
}

#[test]
fn remote_signer_without_selection_uses_first_node_account() {
    let injected = Arc::new(FakeInjected {
        selected: None,
        ..FakeInjected::on(ETH_ID)
    });
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    let config = resolution.config().expect("deposit config");
    assert_eq!(config.arb_signer.locator(), SignerLocator::Index(0));
    assert_eq!(config.arb_signer.address().expect("node account"), node_account());
}

#[test]
fn unknown_network_resolves_to_wrong_network_and_still_listens() {
    let injected = Arc::new(FakeInjected::on(5));
    let factory = FakeFactory::default();

    let resolution = resolver()
        .resolve(&injected, &factory, false)
        .expect("resolve");
    assert_eq!(resolution.state(), ConnectionState::WrongNetwork);
    assert!(resolution.config().is_none());
    assert_eq!(*injected.listeners_registered.lock().expect("lock"), 1);
}

#[test]
fn missing_remote_url_is_an_initialization_error() {
    let mut resolver = resolver();
    resolver.endpoints.arb_validator_url = None;
    let injected = Arc::new(FakeInjected::on(ETH_ID));
    let factory = FakeFactory::default();

    let err = resolver
        .resolve(&injected, &factory, false)
        .expect_err("must fail");
    assert_eq!(err, ResolveError::MissingEndpoint(ChainRole::L2));
    assert!(err.to_string().contains("initialization error"));
}

#[test]
fn remote_factory_failure_is_an_initialization_error() {
    let injected = Arc::new(FakeInjected::on(ARB_ID));
    let factory = FakeFactory {
        fail: true,
        ..FakeFactory::default()
    };

    let err = resolver()
        .resolve(&injected, &factory, false)
        .expect_err("must fail");
    assert!(matches!(err, ResolveError::Remote(_)));
}

#[test]
fn provider_events_request_reload() {
    let injected = FakeInjected::on(ETH_ID);
    assert!(!needs_reload(&[]));

    injected.push_event(ProviderEventKind::ChainChanged);
    let events = arb_bridge_core::InjectedPort::drain_events(&injected).expect("drain");
    assert!(needs_reload(&events));

    injected.push_event(ProviderEventKind::AccountsChanged);
    let events = arb_bridge_core::InjectedPort::drain_events(&injected).expect("drain");
    assert!(needs_reload(&events));
}
