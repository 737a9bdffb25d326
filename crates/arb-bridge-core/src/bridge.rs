use std::sync::Arc;

use alloy::primitives::Address;

use crate::domain::{BridgeMode, ChainRole};
use crate::ports::ProviderPort;
use crate::signer::{Signer, SignerLocator};

/// Provider and signer handles for both sides of the bridge.
///
/// One side is always the injected wallet (signing by index 0), the other a
/// remote endpoint signing as the wallet's selected address.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub mode: BridgeMode,
    pub eth_provider: Arc<dyn ProviderPort>,
    pub arb_provider: Arc<dyn ProviderPort>,
    pub eth_signer: Signer,
    pub arb_signer: Signer,
}

impl BridgeConfig {
    pub fn deposit(
        injected: Arc<dyn ProviderPort>,
        remote_arb: Arc<dyn ProviderPort>,
        selected: Option<Address>,
    ) -> Self {
        Self {
            mode: BridgeMode::Deposit,
            eth_signer: Signer::new(Arc::clone(&injected), SignerLocator::Index(0)),
            arb_signer: Signer::new(
                Arc::clone(&remote_arb),
                SignerLocator::from_selected(selected),
            ),
            eth_provider: injected,
            arb_provider: remote_arb,
        }
    }

    pub fn withdraw(
        injected: Arc<dyn ProviderPort>,
        remote_eth: Arc<dyn ProviderPort>,
        selected: Option<Address>,
    ) -> Self {
        Self {
            mode: BridgeMode::Withdraw,
            eth_signer: Signer::new(
                Arc::clone(&remote_eth),
                SignerLocator::from_selected(selected),
            ),
            arb_signer: Signer::new(Arc::clone(&injected), SignerLocator::Index(0)),
            eth_provider: remote_eth,
            arb_provider: injected,
        }
    }

    pub fn for_mode(
        mode: BridgeMode,
        injected: Arc<dyn ProviderPort>,
        remote: Arc<dyn ProviderPort>,
        selected: Option<Address>,
    ) -> Self {
        match mode {
            BridgeMode::Deposit => Self::deposit(injected, remote, selected),
            BridgeMode::Withdraw => Self::withdraw(injected, remote, selected),
        }
    }

    pub fn provider(&self, role: ChainRole) -> &Arc<dyn ProviderPort> {
        match role {
            ChainRole::L1 => &self.eth_provider,
            ChainRole::L2 => &self.arb_provider,
        }
    }

    pub fn signer(&self, role: ChainRole) -> &Signer {
        match role {
            ChainRole::L1 => &self.eth_signer,
            ChainRole::L2 => &self.arb_signer,
        }
    }
}
