//! Main bridge view, shown once a mode is detected.

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes};
use eframe::egui;

use arb_bridge_core::{BridgeConfig, BridgeMode, ChainRole, NetworkId, PortError, ProviderKind};

use crate::ui;

const SIGNER_CHECK_MESSAGE: &[u8] = b"arb-bridge signer check";

/// What one side of the bridge looks like right now.
#[derive(Debug, Clone)]
pub struct SideDetails {
    pub role: ChainRole,
    pub kind: ProviderKind,
    pub endpoint: String,
    pub signer: Result<Address, String>,
    pub network: Result<NetworkId, String>,
    pub block_number: Result<u64, String>,
}

impl SideDetails {
    #[cfg(not(target_arch = "wasm32"))]
    fn failed(config: &BridgeConfig, role: ChainRole, message: &str) -> Self {
        let provider = config.provider(role);
        Self {
            role,
            kind: provider.kind(),
            endpoint: provider.endpoint(),
            signer: Err(message.to_owned()),
            network: Err(message.to_owned()),
            block_number: Err(message.to_owned()),
        }
    }
}

pub async fn load_side(config: &BridgeConfig, role: ChainRole) -> SideDetails {
    let provider = config.provider(role);
    let signer = config.signer(role).address_async().await;
    let network = provider.network_id_async().await;
    let block_number = match provider
        .request_async("eth_blockNumber", serde_json::json!([]))
        .await
    {
        Ok(value) => parse_quantity(&value),
        Err(e) => Err(e),
    };
    SideDetails {
        role,
        kind: provider.kind(),
        endpoint: provider.endpoint(),
        signer: signer.map_err(|e| e.to_string()),
        network: network.map_err(|e| e.to_string()),
        block_number: block_number.map_err(|e| e.to_string()),
    }
}

async fn load_both(config: &BridgeConfig) -> [SideDetails; 2] {
    [
        load_side(config, ChainRole::L1).await,
        load_side(config, ChainRole::L2).await,
    ]
}

fn parse_quantity(value: &serde_json::Value) -> Result<u64, PortError> {
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be a hex string".to_owned()))?;
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| PortError::Validation(format!("quantity missing 0x prefix: {raw}")))?;
    u64::from_str_radix(hex, 16)
        .map_err(|e| PortError::Validation(format!("invalid quantity {raw}: {e}")))
}

fn side_index(role: ChainRole) -> usize {
    match role {
        ChainRole::L1 => 0,
        ChainRole::L2 => 1,
    }
}

/// Drives a future to completion on a worker thread's own runtime.
#[cfg(not(target_arch = "wasm32"))]
fn run_blocking<F: std::future::Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(future))
}

type DetailsSlot = Arc<Mutex<Option<[SideDetails; 2]>>>;
type SignatureSlot = Arc<Mutex<Option<(ChainRole, Result<Bytes, String>)>>>;

pub struct BridgeView {
    config: BridgeConfig,
    details: Option<[SideDetails; 2]>,
    pending: DetailsSlot,
    loading: bool,
    signatures: [Option<Result<Bytes, String>>; 2],
    pending_signature: SignatureSlot,
    signing: bool,
}

impl BridgeView {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            details: None,
            pending: Arc::new(Mutex::new(None)),
            loading: false,
            signatures: [None, None],
            pending_signature: Arc::new(Mutex::new(None)),
            signing: false,
        }
    }

    pub fn mode(&self) -> BridgeMode {
        self.config.mode
    }

    fn refresh(&mut self, ctx: &egui::Context) {
        if self.loading {
            return;
        }
        self.loading = true;
        let config = self.config.clone();
        let slot = Arc::clone(&self.pending);
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let details = load_both(&config).await;
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(details);
            }
            ctx.request_repaint();
        });

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            let details = run_blocking(load_both(&config)).unwrap_or_else(|e| {
                tracing::error!("{e}");
                [
                    SideDetails::failed(&config, ChainRole::L1, &e),
                    SideDetails::failed(&config, ChainRole::L2, &e),
                ]
            });
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(details);
            }
            ctx.request_repaint();
        });
    }

    /// Asks one side's signer to sign a fixed message, proving the handle
    /// reaches a wallet or node that holds the key.
    fn verify_signer(&mut self, ctx: &egui::Context, role: ChainRole) {
        if self.signing {
            return;
        }
        self.signing = true;
        self.signatures[side_index(role)] = None;
        let config = self.config.clone();
        let slot = Arc::clone(&self.pending_signature);
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let result = config
                .signer(role)
                .sign_message_async(SIGNER_CHECK_MESSAGE)
                .await
                .map_err(|e| e.to_string());
            if let Ok(mut guard) = slot.lock() {
                *guard = Some((role, result));
            }
            ctx.request_repaint();
        });

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            let result =
                run_blocking(config.signer(role).sign_message_async(SIGNER_CHECK_MESSAGE))
                    .and_then(|r| r.map_err(|e| e.to_string()));
            if let Ok(mut guard) = slot.lock() {
                *guard = Some((role, result));
            }
            ctx.request_repaint();
        });
    }

    fn check_results(&mut self) {
        if let Ok(mut guard) = self.pending.lock() {
            if let Some(details) = guard.take() {
                self.details = Some(details);
                self.loading = false;
            }
        }
        if let Ok(mut guard) = self.pending_signature.lock() {
            if let Some((role, result)) = guard.take() {
                if let Err(e) = &result {
                    tracing::warn!(side = role.label(), "signer check failed: {e}");
                }
                self.signatures[side_index(role)] = Some(result);
                self.signing = false;
            }
        }
    }

    pub fn render(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.details.is_none() {
            self.refresh(ctx);
        }
        self.check_results();

        let mode = self.mode();
        ui::styled_heading(ui, &format!("{} mode", mode.label()));
        ui.label(match mode {
            BridgeMode::Deposit => "Your wallet is on Ethereum: assets move into Arbitrum.",
            BridgeMode::Withdraw => "Your wallet is on Arbitrum: assets move back to Ethereum.",
        });
        ui.add_space(10.0);

        let mut verify = None;
        match &self.details {
            None => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading...");
                });
            }
            Some(details) => {
                for side in details {
                    let signature = self.signatures[side_index(side.role)].as_ref();
                    if render_side(ui, side, mode, signature, self.signing) {
                        verify = Some(side.role);
                    }
                    ui.add_space(10.0);
                }
            }
        }
        if let Some(role) = verify {
            self.verify_signer(ctx, role);
        }

        if ui
            .add_enabled(!self.loading, egui::Button::new("🔄 Refresh"))
            .clicked()
        {
            self.refresh(ctx);
        }
    }
}

/// Returns true when the signer check was requested.
fn render_side(
    ui: &mut egui::Ui,
    side: &SideDetails,
    mode: BridgeMode,
    signature: Option<&Result<Bytes, String>>,
    signing: bool,
) -> bool {
    let mut verify = false;
    ui::card(ui, |ui| {
        let wallet_side = mode.injected_role() == side.role;
        ui::section_header(
            ui,
            &format!(
                "{} ({})",
                side.role.label(),
                if wallet_side { "wallet" } else { "remote" }
            ),
        );
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Provider:").strong());
            ui.label(format!("{} · {}", side.kind.label(), side.endpoint));
        });
        match &side.signer {
            Ok(address) => ui::labeled_field_with_copy(ui, "Signer", &address.to_string()),
            Err(e) => ui::error_message(ui, &format!("Signer unavailable: {e}")),
        }
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Network:").strong());
            match &side.network {
                Ok(id) => ui.label(egui::RichText::new(id.to_string()).monospace()),
                Err(e) => ui.label(egui::RichText::new(e).color(egui::Color32::GRAY)),
            };
        });
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Latest block:").strong());
            match &side.block_number {
                Ok(n) => ui.label(egui::RichText::new(n.to_string()).monospace()),
                Err(e) => ui.label(egui::RichText::new(e).color(egui::Color32::GRAY)),
            };
        });

        ui.add_space(4.0);
        verify = ui
            .add_enabled(!signing, egui::Button::new("✍ Verify signer"))
            .clicked();
        match signature {
            Some(Ok(sig)) => ui::labeled_field_with_copy(ui, "Signature", &sig.to_string()),
            Some(Err(e)) => ui::error_message(ui, &format!("Signing failed: {e}")),
            None => {}
        }
    });
    verify
}
