use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes};
use serde_json::Value;

use arb_bridge_core::{
    parse_accounts, InjectedPort, NetworkId, PortError, PortFuture, ProviderEvent,
    ProviderEventKind, ProviderKind, ProviderPort,
};

use crate::BridgeEnvConfig;

/// The wallet-injected provider (`window.ethereum`).
///
/// Natively there is no browser, so an EIP-1193 proxy endpoint can stand in
/// for the wallet. Without either, development builds fall back to an
/// in-memory wallet and production builds report the wallet as missing.
#[derive(Debug, Clone)]
pub struct InjectedAdapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
    async_client: reqwest::Client,
    poll_interval_ms: u64,
}

/// Account and network snapshots, each compared only against values from
/// the same source: the permitted account list comes from
/// `eth_accounts`/`eth_requestAccounts`, `selected` from the browser
/// wallet's `selectedAddress`.
#[derive(Debug, Clone, Default)]
struct ProviderState {
    accounts: Option<Vec<Address>>,
    selected: Option<Address>,
    network_id: Option<NetworkId>,
    listening: bool,
    event_seq: u64,
    events: Vec<ProviderEvent>,
}

#[cfg(not(target_arch = "wasm32"))]
impl ProxyRuntime {
    fn new(base_url: &str, config: &BridgeEnvConfig) -> Result<Self, PortError> {
        let timeout = std::time::Duration::from_millis(config.rpc_timeout_ms);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.to_owned(),
            client,
            async_client: crate::json_rpc::async_client(config.rpc_timeout_ms)?,
            poll_interval_ms: config.provider_poll_interval_ms,
        })
    }
}

impl ProviderState {
    fn push_event(&mut self, kind: ProviderEventKind, value: String) {
        self.event_seq = self.event_seq.saturating_add(1);
        let sequence = self.event_seq;
        self.events.push(ProviderEvent {
            sequence,
            kind,
            value,
        });
    }

    /// Records a change only against a previously observed value, so the
    /// first read never looks like a switch.
    fn observe_accounts(&mut self, accounts: &[Address]) {
        let changed = self
            .accounts
            .as_deref()
            .is_some_and(|previous| previous != accounts);
        if changed {
            self.push_event(ProviderEventKind::AccountsChanged, accounts_json(accounts));
        }
        self.accounts = Some(accounts.to_vec());
    }

    fn observe_selected(&mut self, selected: Address) {
        if self.selected.is_some_and(|previous| previous != selected) {
            self.push_event(ProviderEventKind::AccountsChanged, accounts_json(&[selected]));
        }
        self.selected = Some(selected);
    }

    fn selected_address(&self) -> Option<Address> {
        self.selected
            .or_else(|| self.accounts.as_ref().and_then(|a| a.first().copied()))
    }

    fn observe_network(&mut self, network_id: NetworkId) {
        if self.network_id.is_some_and(|previous| previous != network_id) {
            self.push_event(ProviderEventKind::ChainChanged, network_id.to_string());
        }
        self.network_id = Some(network_id);
    }
}

impl InjectedAdapter {
    pub fn with_config(config: &BridgeEnvConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        let mode = if browser_provider_available() {
            ProviderMode::Browser
        } else {
            ProviderMode::Disabled("window.ethereum missing".to_owned())
        };

        #[cfg(not(target_arch = "wasm32"))]
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            match ProxyRuntime::new(base_url, config) {
                Ok(proxy) => ProviderMode::Proxy(proxy),
                Err(e) => ProviderMode::Disabled(format!(
                    "failed to initialize EIP-1193 proxy client: {e}"
                )),
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        let mut state = ProviderState::default();
        if matches!(mode, ProviderMode::Deterministic) {
            state.accounts = Some(vec![default_account()]);
            state.network_id = Some(config.eth_network_id.unwrap_or(NetworkId(1)));
        }

        let adapter = Self::from_parts(mode, state);

        #[cfg(target_arch = "wasm32")]
        if matches!(adapter.mode, ProviderMode::Browser) {
            let _ = adapter.refresh_browser_snapshot();
        }

        adapter
    }

    /// In-memory wallet on a fixed network.
    pub fn deterministic(network_id: NetworkId, accounts: Vec<Address>) -> Self {
        Self::from_parts(
            ProviderMode::Deterministic,
            ProviderState {
                accounts: Some(accounts),
                network_id: Some(network_id),
                ..ProviderState::default()
            },
        )
    }

    /// A provider that reports itself as absent.
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::from_parts(ProviderMode::Disabled(reason.into()), ProviderState::default())
    }

    fn from_parts(mode: ProviderMode, state: ProviderState) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::NotFound(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.push_event(ProviderEventKind::AccountsChanged, accounts_json(&accounts));
        g.accounts = Some(accounts);
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, network_id: NetworkId) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.push_event(ProviderEventKind::ChainChanged, network_id.to_string());
        g.network_id = Some(network_id);
        Ok(())
    }

    fn deterministic_request(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => {
                let accounts = self.lock_state()?.accounts.clone().unwrap_or_default();
                Ok(serde_json::json!(accounts
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()))
            }
            "net_version" => Ok(Value::String(self.network_id()?.to_string())),
            "eth_chainId" => Ok(Value::String(format!("0x{:x}", self.network_id()?.0))),
            "eth_sendTransaction" => {
                let canonical = serde_json::to_vec(params).map_err(|e| {
                    PortError::Validation(format!("tx payload serialization failed: {e}"))
                })?;
                Ok(Value::String(keccak256(canonical).to_string()))
            }
            "personal_sign" => {
                let mut seed = Vec::new();
                seed.extend_from_slice(method.as_bytes());
                seed.extend_from_slice(params.to_string().as_bytes());
                let hash = keccak256(seed);
                let mut sig = Vec::with_capacity(65);
                sig.extend_from_slice(hash.as_slice());
                sig.extend_from_slice(hash.as_slice());
                sig.push(27);
                Ok(Value::String(Bytes::from(sig).to_string()))
            }
            _ => Err(PortError::NotImplemented(
                "deterministic provider does not support this method",
            )),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn proxy(&self) -> Result<&ProxyRuntime, PortError> {
        match &self.mode {
            ProviderMode::Proxy(proxy) => Ok(proxy),
            ProviderMode::Disabled(reason) => Err(PortError::NotFound(reason.clone())),
            _ => Err(PortError::NotImplemented(
                "eip1193 proxy runtime not enabled",
            )),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = self.proxy()?;
        crate::json_rpc::post_json_rpc(&proxy.client, &proxy.base_url, method, params)
            .map_err(proxy_error)
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_call_async(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = self.proxy()?;
        crate::json_rpc::post_json_rpc_async(&proxy.async_client, &proxy.base_url, method, params)
            .await
            .map_err(proxy_error)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_proxy_poller(&self, interval_ms: u64) {
        let adapter = self.clone();
        let interval = std::time::Duration::from_millis(interval_ms.max(250));
        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            // The poller's own handle is the last one left.
            if Arc::strong_count(&adapter.state) <= 1 {
                break;
            }
            if let Err(e) = adapter.accounts().and_then(|_| adapter.network_id()) {
                tracing::debug!("eip1193 proxy poll failed: {e}");
            }
        });
    }

    /// Prompts the wallet for access; the synchronous port only sees the
    /// snapshot it leaves behind.
    #[cfg(target_arch = "wasm32")]
    pub async fn wasm_request_accounts_async(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        let result = self
            .wasm_request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        let accounts = parse_accounts(&result)?;
        self.lock_state()?.observe_accounts(&accounts);
        Ok(accounts)
    }

    #[cfg(target_arch = "wasm32")]
    async fn wasm_request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        use wasm_bindgen::JsCast;

        let provider = browser_provider()?;
        let request_fn = get_prop(&provider, "request")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or(PortError::NotImplemented(
                "window.ethereum.request is unavailable",
            ))?;

        let request = serde_json::json!({
            "method": method,
            "params": params,
        });
        let request_js = serde_wasm_bindgen::to_value(&request)
            .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
        let promise_js = request_fn.call1(&provider, &request_js).map_err(|e| {
            PortError::Transport(format!("provider request dispatch failed: {e:?}"))
        })?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            PortError::Transport("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(|e| PortError::Transport(format!("provider request rejected: {e:?}")))?;
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")))
    }

    #[cfg(target_arch = "wasm32")]
    fn refresh_browser_snapshot(&self) -> Result<(), PortError> {
        use wasm_bindgen::JsValue;

        let provider = browser_provider()?;
        let selected = get_prop(&provider, "selectedAddress").unwrap_or(JsValue::NULL);
        let mut network = get_prop(&provider, "networkVersion").unwrap_or(JsValue::NULL);
        if network.is_null() || network.is_undefined() {
            network = get_prop(&provider, "chainId").unwrap_or(JsValue::NULL);
        }

        let mut g = self.lock_state()?;
        if let Some(s) = selected.as_string() {
            let parsed: Address = s
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid selectedAddress: {e}")))?;
            g.observe_selected(parsed);
        }
        if !network.is_null() && !network.is_undefined() {
            g.observe_network(js_network_id(network)?);
        }
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn register_browser_hooks(&self) -> Result<(), PortError> {
        use wasm_bindgen::{closure::Closure, JsCast, JsValue};

        let provider = browser_provider()?;
        let on_fn = get_prop(&provider, "on")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .or_else(|| {
                get_prop(&provider, "addListener")
                    .ok()
                    .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            })
            .ok_or(PortError::NotImplemented(
                "provider does not expose on/addListener",
            ))?;

        let state_for_accounts = Arc::clone(&self.state);
        let accounts_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let mut accounts = Vec::new();
            if js_sys::Array::is_array(&value) {
                for item in js_sys::Array::from(&value).iter() {
                    if let Some(addr) = item.as_string().and_then(|raw| raw.parse().ok()) {
                        accounts.push(addr);
                    }
                }
            }
            if let Ok(mut g) = state_for_accounts.lock() {
                g.push_event(ProviderEventKind::AccountsChanged, accounts_json(&accounts));
                g.selected = accounts.first().copied();
                g.accounts = Some(accounts);
            }
        });

        let state_for_chain = Arc::clone(&self.state);
        let chain_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if let Ok(network_id) = js_network_id(value) {
                if let Ok(mut g) = state_for_chain.lock() {
                    g.push_event(ProviderEventKind::ChainChanged, network_id.to_string());
                    g.network_id = Some(network_id);
                }
            }
        });

        on_fn
            .call2(
                &provider,
                &JsValue::from_str("accountsChanged"),
                accounts_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| PortError::Transport(format!("register accountsChanged failed: {e:?}")))?;
        on_fn
            .call2(
                &provider,
                &JsValue::from_str("chainChanged"),
                chain_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| PortError::Transport(format!("register chainChanged failed: {e:?}")))?;

        // Listeners live as long as the page.
        accounts_cb.forget();
        chain_cb.forget();
        Ok(())
    }
}

impl ProviderPort for InjectedAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Injected
    }

    fn endpoint(&self) -> String {
        match &self.mode {
            ProviderMode::Disabled(_) => "unavailable".to_owned(),
            ProviderMode::Deterministic => "deterministic wallet".to_owned(),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => proxy.base_url.clone(),
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => "window.ethereum".to_owned(),
        }
    }

    fn accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;

        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            self.refresh_browser_snapshot()?;
        }

        #[cfg(not(target_arch = "wasm32"))]
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_accounts", serde_json::json!([]))?;
            let accounts = parse_accounts(&result)?;
            self.lock_state()?.observe_accounts(&accounts);
            return Ok(accounts);
        }

        let g = self.lock_state()?;
        let accounts = match (&g.accounts, g.selected) {
            (Some(accounts), _) => accounts.clone(),
            (None, Some(selected)) => vec![selected],
            (None, None) => Vec::new(),
        };
        Ok(accounts)
    }

    fn network_id(&self) -> Result<NetworkId, PortError> {
        self.check_mode()?;

        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            self.refresh_browser_snapshot()?;
        }

        #[cfg(not(target_arch = "wasm32"))]
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("net_version", serde_json::json!([]))?;
            let network_id = NetworkId::from_json(&result)?;
            self.lock_state()?.observe_network(network_id);
            return Ok(network_id);
        }

        self.lock_state()?
            .network_id
            .ok_or_else(|| PortError::NotFound("injected provider reported no network".to_owned()))
    }

    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.check_mode()?;

        #[cfg(not(target_arch = "wasm32"))]
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            return self.proxy_call(method, params);
        }

        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return Err(PortError::NotImplemented(
                "browser wallet requests are async; use request_async",
            ));
        }

        self.deterministic_request(method, &params)
    }

    fn accounts_async(&self) -> PortFuture<'_, Vec<Address>> {
        Box::pin(async move {
            let result = self
                .request_async("eth_accounts", serde_json::json!([]))
                .await?;
            let accounts = parse_accounts(&result)?;
            self.lock_state()?.observe_accounts(&accounts);
            Ok(accounts)
        })
    }

    fn network_id_async(&self) -> PortFuture<'_, NetworkId> {
        Box::pin(async move {
            let result = self
                .request_async("net_version", serde_json::json!([]))
                .await?;
            let network_id = NetworkId::from_json(&result)?;
            self.lock_state()?.observe_network(network_id);
            Ok(network_id)
        })
    }

    fn request_async<'a>(&'a self, method: &'a str, params: Value) -> PortFuture<'a, Value> {
        Box::pin(async move {
            self.check_mode()?;
            match &self.mode {
                #[cfg(not(target_arch = "wasm32"))]
                ProviderMode::Proxy(_) => self.proxy_call_async(method, params).await,
                #[cfg(target_arch = "wasm32")]
                ProviderMode::Browser => self.wasm_request(method, params).await,
                _ => self.deterministic_request(method, &params),
            }
        })
    }
}

impl InjectedPort for InjectedAdapter {
    fn is_available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;

        #[cfg(not(target_arch = "wasm32"))]
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_requestAccounts", serde_json::json!([]))?;
            let accounts = parse_accounts(&result)?;
            self.lock_state()?.observe_accounts(&accounts);
            return Ok(accounts);
        }

        let accounts = self.accounts()?;
        if accounts.is_empty() {
            return Err(PortError::Policy(
                "no provider accounts available; unlock/connect wallet".to_owned(),
            ));
        }
        Ok(accounts)
    }

    fn selected_address(&self) -> Option<Address> {
        self.state.lock().ok().and_then(|g| g.selected_address())
    }

    fn register_change_listeners(&self) -> Result<(), PortError> {
        self.check_mode()?;
        {
            let mut g = self.lock_state()?;
            if g.listening {
                return Ok(());
            }
            g.listening = true;
        }

        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            if let Err(e) = self.register_browser_hooks() {
                self.lock_state()?.listening = false;
                return Err(e);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        if let ProviderMode::Proxy(proxy) = &self.mode {
            self.spawn_proxy_poller(proxy.poll_interval_ms);
        }

        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        self.check_mode()?;
        let mut g = self.lock_state()?;
        Ok(std::mem::take(&mut g.events))
    }
}

fn default_account() -> Address {
    Address::repeat_byte(0x11)
}

fn accounts_json(accounts: &[Address]) -> String {
    serde_json::to_string(&accounts.iter().map(|a| a.to_string()).collect::<Vec<_>>())
        .unwrap_or_else(|_| "[]".to_owned())
}

#[cfg(not(target_arch = "wasm32"))]
fn proxy_error(e: PortError) -> PortError {
    match e {
        PortError::Transport(msg) => PortError::Transport(format!("eip1193 proxy: {msg}")),
        other => other,
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_provider_available() -> bool {
    browser_provider().is_ok()
}

#[cfg(target_arch = "wasm32")]
fn browser_provider() -> Result<wasm_bindgen::JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::NotFound("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn get_prop(target: &wasm_bindgen::JsValue, key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}

#[cfg(target_arch = "wasm32")]
fn js_network_id(value: wasm_bindgen::JsValue) -> Result<NetworkId, PortError> {
    if let Some(s) = value.as_string() {
        return NetworkId::parse(&s);
    }
    if let Some(num) = value.as_f64() {
        return NetworkId::from_f64(num);
    }
    Err(PortError::Validation("invalid JS network id".to_owned()))
}
