//! Top-level application shell

use eframe::egui;

use arb_bridge_adapters::BridgeEnvConfig;
use arb_bridge_core::ConnectionState;

use crate::injector::Injector;
use crate::ui::{self, AlertVariant};

pub struct App {
    injector: Result<Injector, String>,
}

impl App {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let injector = match BridgeEnvConfig::from_env() {
            Ok(config) => {
                tracing::info!(
                    eth = ?config.eth_network_id,
                    arb = ?config.arb_network_id,
                    "bridge networks configured"
                );
                Ok(Injector::new(&config))
            }
            Err(e) => {
                tracing::error!("invalid bridge configuration: {e}");
                Err(format!("invalid configuration: {e}"))
            }
        };
        Self { injector }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        if let Ok(injector) = &mut self.injector {
            injector.update(ctx);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("🌉 Arbitrum Bridge")
                        .size(22.0)
                        .color(ui::ACCENT),
                );
                ui.add_space(30.0);
                ui.separator();
                ui.add_space(10.0);
                let state = self
                    .injector
                    .as_ref()
                    .ok()
                    .and_then(|i| i.status().connection_state());
                ui.label(status_badge(state));
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "v{} · {} · built {}",
                    env!("CARGO_PKG_VERSION"),
                    env!("GIT_HASH"),
                    env!("BUILD_TIME")
                ))
                .small()
                .color(egui::Color32::GRAY),
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                match &mut self.injector {
                    Ok(injector) => injector.render(ui, ctx),
                    Err(message) => ui::render_alert(ui, message, AlertVariant::Danger),
                }
                ui.add_space(20.0);
            });
        });
    }
}

fn status_badge(state: Option<ConnectionState>) -> egui::RichText {
    let (text, color) = match state {
        Some(ConnectionState::Loading) => ("Detecting wallet…", egui::Color32::GRAY),
        Some(ConnectionState::NoWallet) => ("No wallet", egui::Color32::from_rgb(220, 80, 80)),
        Some(ConnectionState::WrongNetwork) => {
            ("Unsupported network", egui::Color32::from_rgb(220, 180, 50))
        }
        Some(ConnectionState::DepositMode) => ("Deposit", ui::ACCENT),
        Some(ConnectionState::WithdrawMode) => ("Withdraw", ui::ACCENT),
        None => ("Error", egui::Color32::from_rgb(220, 80, 80)),
    };
    egui::RichText::new(text).color(color).strong()
}
