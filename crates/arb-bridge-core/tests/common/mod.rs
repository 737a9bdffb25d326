#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use serde_json::Value;

use arb_bridge_core::{
    ChainRole, InjectedPort, NetworkId, PortError, ProviderEvent, ProviderEventKind, ProviderKind,
    ProviderPort, RemoteFactory,
};

#[derive(Debug, Default)]
pub struct FakeInjected {
    pub available: bool,
    pub network: Option<NetworkId>,
    pub accounts: Vec<Address>,
    pub selected: Option<Address>,
    pub listeners_registered: Mutex<u32>,
    pub events: Mutex<Vec<ProviderEvent>>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl FakeInjected {
    pub fn on(network: u64) -> Self {
        Self {
            available: true,
            network: Some(NetworkId(network)),
            accounts: vec![wallet_account()],
            selected: Some(wallet_account()),
            ..Self::default()
        }
    }

    pub fn push_event(&self, kind: ProviderEventKind) {
        let mut g = self.events.lock().expect("events lock");
        let sequence = g.len() as u64 + 1;
        g.push(ProviderEvent {
            sequence,
            kind,
            value: String::new(),
        });
    }
}

impl ProviderPort for FakeInjected {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Injected
    }

    fn endpoint(&self) -> String {
        "fake://injected".to_owned()
    }

    fn accounts(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.accounts.clone())
    }

    fn network_id(&self) -> Result<NetworkId, PortError> {
        self.network
            .ok_or_else(|| PortError::Transport("network version unavailable".to_owned()))
    }

    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((method.to_owned(), params));
        match method {
            "eth_sendTransaction" => Ok(Value::String(format!("0x{}", "ab".repeat(32)))),
            "personal_sign" => Ok(Value::String(format!("0x{}1b", "cd".repeat(64)))),
            _ => Err(PortError::NotImplemented("fake injected method")),
        }
    }
}

impl InjectedPort for FakeInjected {
    fn is_available(&self) -> bool {
        self.available
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.accounts.clone())
    }

    fn selected_address(&self) -> Option<Address> {
        self.selected
    }

    fn register_change_listeners(&self) -> Result<(), PortError> {
        *self.listeners_registered.lock().expect("listener lock") += 1;
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        Ok(std::mem::take(&mut *self.events.lock().expect("events lock")))
    }
}

#[derive(Debug)]
pub struct FakeRemote {
    pub url: String,
    pub accounts: Vec<Address>,
}

impl ProviderPort for FakeRemote {
    fn kind(&self) -> ProviderKind {
        ProviderKind::JsonRpc
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }

    fn accounts(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.accounts.clone())
    }

    fn network_id(&self) -> Result<NetworkId, PortError> {
        Err(PortError::NotImplemented("fake remote network id"))
    }

    fn request(&self, _method: &str, _params: Value) -> Result<Value, PortError> {
        Err(PortError::NotImplemented("fake remote request"))
    }
}

#[derive(Debug, Default)]
pub struct FakeFactory {
    pub connected: Mutex<Vec<(ChainRole, String)>>,
    pub fail: bool,
}

impl RemoteFactory for FakeFactory {
    fn connect(&self, role: ChainRole, url: &str) -> Result<Arc<dyn ProviderPort>, PortError> {
        if self.fail {
            return Err(PortError::Validation(format!("bad url {url}")));
        }
        self.connected
            .lock()
            .expect("factory lock")
            .push((role, url.to_owned()));
        Ok(Arc::new(FakeRemote {
            url: url.to_owned(),
            accounts: vec![node_account()],
        }))
    }
}

pub fn wallet_account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid wallet account")
}

pub fn node_account() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid node account")
}
