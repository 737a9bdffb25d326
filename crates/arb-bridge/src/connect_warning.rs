//! Shown when the wallet sits on neither bridge network (and as the `#info` page).

use eframe::egui;

use arb_bridge_core::{BridgeMode, NetworkSettings};

use crate::ui::{self, AlertVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningAction {
    None,
    Retry,
}

pub fn render(ui: &mut egui::Ui, settings: &NetworkSettings) -> WarningAction {
    let mut action = WarningAction::None;

    ui::render_alert(
        ui,
        "Connect your wallet to one of the networks below to use the bridge.",
        AlertVariant::Danger,
    );
    ui.add_space(15.0);

    ui::card(ui, |ui| {
        ui::section_header(ui, "Supported networks");
        for mode in [BridgeMode::Deposit, BridgeMode::Withdraw] {
            let role = mode.injected_role();
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(role.label()).strong());
                match settings.network_id(role) {
                    Some(id) => ui.label(egui::RichText::new(format!("network {id}")).monospace()),
                    None => ui.label(
                        egui::RichText::new("not configured").color(egui::Color32::GRAY),
                    ),
                };
                ui.label(format!("→ {}", describe(mode)));
            });
        }
    });

    ui.add_space(10.0);
    ui.label("The bridge reloads by itself once your wallet switches network or account.");
    ui.add_space(10.0);
    if ui.button("🔄 Check again").clicked() {
        action = WarningAction::Retry;
    }

    action
}

fn describe(mode: BridgeMode) -> String {
    let from = mode.injected_role();
    let to = from.other();
    match mode {
        BridgeMode::Deposit => format!("deposit from {} into {}", from.label(), to.label()),
        BridgeMode::Withdraw => format!("withdraw from {} to {}", from.label(), to.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_each_direction() {
        assert_eq!(describe(BridgeMode::Deposit), "deposit from Ethereum into Arbitrum");
        assert_eq!(describe(BridgeMode::Withdraw), "withdraw from Arbitrum to Ethereum");
    }
}
