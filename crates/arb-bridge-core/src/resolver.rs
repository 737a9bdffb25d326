use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::BridgeConfig;
use crate::domain::{BridgeMode, ChainRole, ConnectionState, NetworkSettings};
use crate::ports::{InjectedPort, PortError, ProviderEvent, ProviderPort, RemoteFactory};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("initialization error: no {} endpoint configured", .0.label())]
    MissingEndpoint(ChainRole),
    #[error("initialization error: {0}")]
    Remote(#[from] PortError),
}

/// Remote JSON-RPC URLs for the side the wallet is not on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEndpoints {
    pub eth_node_url: Option<String>,
    pub arb_validator_url: Option<String>,
}

impl RemoteEndpoints {
    pub fn url(&self, role: ChainRole) -> Option<&str> {
        match role {
            ChainRole::L1 => self.eth_node_url.as_deref(),
            ChainRole::L2 => self.arb_validator_url.as_deref(),
        }
    }
}

/// Outcome of one detection pass. `config` is present exactly when the
/// state is one of the connected modes.
#[derive(Debug, Clone)]
pub struct Resolution {
    state: ConnectionState,
    config: Option<BridgeConfig>,
}

impl Resolution {
    pub fn no_wallet() -> Self {
        Self {
            state: ConnectionState::NoWallet,
            config: None,
        }
    }

    pub fn wrong_network() -> Self {
        Self {
            state: ConnectionState::WrongNetwork,
            config: None,
        }
    }

    pub fn connected(config: BridgeConfig) -> Self {
        Self {
            state: config.mode.into(),
            config: Some(config),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> Option<&BridgeConfig> {
        self.config.as_ref()
    }

    pub fn into_config(self) -> Option<BridgeConfig> {
        self.config
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    pub settings: NetworkSettings,
    pub endpoints: RemoteEndpoints,
}

impl Resolver {
    pub fn new(settings: NetworkSettings, endpoints: RemoteEndpoints) -> Self {
        Self {
            settings,
            endpoints,
        }
    }

    /// Runs one detection pass against the injected provider.
    ///
    /// `info_requested` short-circuits to the wrong-network view, which
    /// doubles as the info page.
    pub fn resolve<I>(
        &self,
        injected: &Arc<I>,
        remotes: &dyn RemoteFactory,
        info_requested: bool,
    ) -> Result<Resolution, ResolveError>
    where
        I: InjectedPort + 'static,
    {
        if info_requested {
            return Ok(Resolution::wrong_network());
        }
        if !injected.is_available() {
            tracing::info!("no injected provider detected");
            return Ok(Resolution::no_wallet());
        }

        if let Err(e) = injected.request_accounts() {
            tracing::warn!("injected provider did not expose accounts: {e}");
        }
        let network_id = match injected.network_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("failed to read injected network version: {e}");
                return Ok(Resolution::no_wallet());
            }
        };

        if let Err(e) = injected.register_change_listeners() {
            tracing::warn!("failed to register provider change listeners: {e}");
        }

        match self.settings.classify(network_id) {
            Some(mode) => Ok(Resolution::connected(self.build(mode, injected, remotes)?)),
            None => {
                tracing::info!(
                    network = %network_id,
                    eth = ?self.settings.eth_network_id,
                    arb = ?self.settings.arb_network_id,
                    "wallet is on an unsupported network"
                );
                Ok(Resolution::wrong_network())
            }
        }
    }

    fn build<I>(
        &self,
        mode: BridgeMode,
        injected: &Arc<I>,
        remotes: &dyn RemoteFactory,
    ) -> Result<BridgeConfig, ResolveError>
    where
        I: InjectedPort + 'static,
    {
        match mode {
            BridgeMode::Deposit => tracing::info!("deposit mode detected"),
            BridgeMode::Withdraw => tracing::info!("withdrawal mode detected"),
        }

        let remote_role = mode.remote_role();
        let url = self
            .endpoints
            .url(remote_role)
            .ok_or(ResolveError::MissingEndpoint(remote_role))?;
        let remote = remotes.connect(remote_role, url)?;
        let selected = injected.selected_address();
        let injected: Arc<dyn ProviderPort> = Arc::clone(injected) as Arc<dyn ProviderPort>;
        Ok(BridgeConfig::for_mode(mode, injected, remote, selected))
    }
}

/// Whether drained provider events invalidate the current resolution.
///
/// Every provider event is an account or network switch, and either one
/// changes which signers and remote endpoint apply.
pub fn needs_reload(events: &[ProviderEvent]) -> bool {
    !events.is_empty()
}
