//! Wallet detection gate in front of the bridge view.
//!
//! Runs one detection pass per `Loading` state, then renders exactly one of:
//! loading, no wallet, wrong network, or the bridge itself in deposit or
//! withdraw mode. Wallet account/network switches drop back to `Loading`.

use std::sync::{Arc, Mutex};

use eframe::egui;

use arb_bridge_adapters::{BridgeEnvConfig, HttpRemoteFactory, InjectedAdapter};
use arb_bridge_core::{
    needs_reload, ConnectionState, InjectedPort, NetworkSettings, ProviderEvent, Resolution,
    ResolveError, Resolver,
};

use crate::bridge_view::BridgeView;
use crate::connect_warning::{self, WarningAction};
use crate::ui::{self, AlertVariant};

const METAMASK_DOWNLOAD_URL: &str = "https://metamask.io/download.html";
const NO_WALLET_MESSAGE: &str =
    "Ethereum provider not detected; make sure you have MetaMask installed in your browser.";

type DetectionSlot = Arc<Mutex<Option<Result<Resolution, ResolveError>>>>;

/// Where the gate currently stands.
#[derive(Debug)]
pub enum Status {
    Loading { in_flight: bool },
    Ready(Resolution),
    Failed(ResolveError),
}

impl Default for Status {
    fn default() -> Self {
        Status::Loading { in_flight: false }
    }
}

impl Status {
    /// `None` while an initialization error is shown.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        match self {
            Status::Loading { .. } => Some(ConnectionState::Loading),
            Status::Ready(resolution) => Some(resolution.state()),
            Status::Failed(_) => None,
        }
    }

    /// Claims the detection pass; false if one already ran or is running.
    pub fn begin(&mut self) -> bool {
        match self {
            Status::Loading { in_flight } if !*in_flight => {
                *in_flight = true;
                true
            }
            _ => false,
        }
    }

    pub fn finish(&mut self, result: Result<Resolution, ResolveError>) {
        *self = match result {
            Ok(resolution) => Status::Ready(resolution),
            Err(e) => {
                tracing::error!("bridge initialization failed: {e}");
                Status::Failed(e)
            }
        };
    }

    /// Returns true when the events reset the gate to `Loading`.
    pub fn apply_events(&mut self, events: &[ProviderEvent]) -> bool {
        if matches!(self, Status::Loading { .. }) || !needs_reload(events) {
            return false;
        }
        tracing::info!(events = events.len(), "wallet changed; re-running detection");
        *self = Status::default();
        true
    }

    pub fn reload(&mut self) {
        if !matches!(self, Status::Loading { .. }) {
            *self = Status::default();
        }
    }
}

pub struct Injector {
    resolver: Resolver,
    remotes: HttpRemoteFactory,
    injected: Arc<InjectedAdapter>,
    info_requested: bool,
    status: Status,
    detection: DetectionSlot,
    bridge_view: Option<BridgeView>,
}

impl Injector {
    pub fn new(config: &BridgeEnvConfig) -> Self {
        let info_requested = config.info_requested() || location_requests_info();
        Self {
            resolver: Resolver::new(config.network_settings(), config.remote_endpoints()),
            remotes: HttpRemoteFactory::with_config(config),
            injected: Arc::new(InjectedAdapter::with_config(config)),
            info_requested,
            status: Status::default(),
            detection: Arc::new(Mutex::new(None)),
            bridge_view: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.resolver.settings
    }

    pub fn update(&mut self, ctx: &egui::Context) {
        if self.status.begin() {
            self.start_detection(ctx);
        }
        self.check_detection_result();
        self.check_provider_events();
    }

    fn start_detection(&mut self, ctx: &egui::Context) {
        let resolver = self.resolver.clone();
        let remotes = self.remotes;
        let injected = Arc::clone(&self.injected);
        let info_requested = self.info_requested;
        let slot = Arc::clone(&self.detection);
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                if !info_requested && injected.is_available() {
                    if let Err(e) = injected.wasm_request_accounts_async().await {
                        tracing::warn!("wallet did not grant account access: {e}");
                    }
                }
                let result = resolver.resolve(&injected, &remotes, info_requested);
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(result);
                }
                ctx.request_repaint();
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(move || {
                let result = resolver.resolve(&injected, &remotes, info_requested);
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(result);
                }
                ctx.request_repaint();
            });
        }
    }

    fn check_detection_result(&mut self) {
        let result = match self.detection.lock() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                tracing::error!("detection slot poisoned: {e}");
                None
            }
        };
        let Some(result) = result else {
            return;
        };

        self.status.finish(result);
        self.bridge_view = match &self.status {
            Status::Ready(resolution) => resolution.config().cloned().map(BridgeView::new),
            _ => None,
        };
    }

    fn check_provider_events(&mut self) {
        if matches!(self.status, Status::Loading { .. }) {
            return;
        }
        let events = match self.injected.drain_events() {
            Ok(events) => events,
            // A missing wallet has nothing to report.
            Err(_) => return,
        };
        if self.status.apply_events(&events) {
            self.bridge_view = None;
        }
    }

    pub fn render(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if let Status::Failed(e) = &self.status {
            ui::render_alert(ui, &e.to_string(), AlertVariant::Danger);
            ui.add_space(10.0);
            if ui.button("Retry").clicked() {
                self.status.reload();
            }
            return;
        }

        match self.status.connection_state() {
            None | Some(ConnectionState::Loading) => {
                ui::render_alert(ui, "loading...", AlertVariant::Primary);
            }
            Some(ConnectionState::NoWallet) => render_no_wallet(ui),
            Some(ConnectionState::WrongNetwork) => {
                if connect_warning::render(ui, self.settings()) == WarningAction::Retry {
                    self.info_requested = false;
                    self.status.reload();
                    self.bridge_view = None;
                }
            }
            Some(ConnectionState::DepositMode | ConnectionState::WithdrawMode) => {
                match self.bridge_view.as_mut() {
                    Some(view) => view.render(ui, ctx),
                    None => ui::render_alert(ui, "initialization error", AlertVariant::Danger),
                }
            }
        }
    }
}

fn render_no_wallet(ui: &mut egui::Ui) {
    ui::render_alert(ui, NO_WALLET_MESSAGE, AlertVariant::Danger);
    ui.add_space(20.0);
    ui.vertical_centered(|ui| {
        ui::external_link(ui, egui::RichText::new("🦊").size(96.0), METAMASK_DOWNLOAD_URL);
        ui.add_space(10.0);
        ui::external_link(
            ui,
            egui::RichText::new("Install MetaMask").heading(),
            METAMASK_DOWNLOAD_URL,
        );
    });
}

#[cfg(target_arch = "wasm32")]
fn location_requests_info() -> bool {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .is_some_and(|hash| hash == arb_bridge_adapters::config::INFO_PAGE_HASH)
}

#[cfg(not(target_arch = "wasm32"))]
fn location_requests_info() -> bool {
    false
}
