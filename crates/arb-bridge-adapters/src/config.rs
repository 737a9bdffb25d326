use arb_bridge_core::{NetworkId, NetworkSettings, PortError, RemoteEndpoints};
use thiserror::Error;

pub const ETH_NETWORK_ID: &str = "ARB_BRIDGE_ETH_NETWORK_ID";
pub const ARB_NETWORK_ID: &str = "ARB_BRIDGE_ARB_NETWORK_ID";
pub const ETH_NODE_URL: &str = "ARB_BRIDGE_ETH_NODE_URL";
pub const ARB_VALIDATOR_URL: &str = "ARB_BRIDGE_ARB_VALIDATOR_URL";
pub const EIP1193_PROXY_URL: &str = "ARB_BRIDGE_EIP1193_PROXY_URL";
pub const RPC_TIMEOUT_MS: &str = "ARB_BRIDGE_RPC_TIMEOUT_MS";
pub const PROVIDER_POLL_MS: &str = "ARB_BRIDGE_PROVIDER_POLL_MS";
pub const RUNTIME_PROFILE: &str = "ARB_BRIDGE_RUNTIME_PROFILE";
pub const START_PAGE: &str = "ARB_BRIDGE_START_PAGE";

/// Location hash that opens the network info page.
pub const INFO_PAGE_HASH: &str = "#info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    InvalidNetworkId {
        var: &'static str,
        #[source]
        source: PortError,
    },
    #[error("{var}: expected an integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("ARB_BRIDGE_RUNTIME_PROFILE: unknown runtime profile {0:?}")]
    InvalidProfile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEnvConfig {
    pub eth_network_id: Option<NetworkId>,
    pub arb_network_id: Option<NetworkId>,
    pub eth_node_url: Option<String>,
    pub arb_validator_url: Option<String>,
    pub eip1193_proxy_url: Option<String>,
    pub rpc_timeout_ms: u64,
    pub provider_poll_interval_ms: u64,
    pub runtime_profile: RuntimeProfile,
    pub start_page: Option<String>,
}

impl Default for BridgeEnvConfig {
    fn default() -> Self {
        Self {
            eth_network_id: None,
            arb_network_id: None,
            eth_node_url: None,
            arb_validator_url: None,
            eip1193_proxy_url: None,
            rpc_timeout_ms: 15_000,
            provider_poll_interval_ms: 4_000,
            runtime_profile: RuntimeProfile::Development,
            start_page: None,
        }
    }
}

impl BridgeEnvConfig {
    /// Reads the process environment natively; on wasm the values are baked
    /// in at compile time.
    pub fn from_env() -> Result<Self, ConfigError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::from_lookup(|key| std::env::var(key).ok())
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::from_lookup(compile_time_env)
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            eth_network_id: parse_network_id(ETH_NETWORK_ID, get(ETH_NETWORK_ID))?,
            arb_network_id: parse_network_id(ARB_NETWORK_ID, get(ARB_NETWORK_ID))?,
            eth_node_url: get(ETH_NODE_URL),
            arb_validator_url: get(ARB_VALIDATOR_URL),
            eip1193_proxy_url: get(EIP1193_PROXY_URL),
            rpc_timeout_ms: parse_u64(RPC_TIMEOUT_MS, get(RPC_TIMEOUT_MS))?
                .unwrap_or(defaults.rpc_timeout_ms),
            provider_poll_interval_ms: parse_u64(PROVIDER_POLL_MS, get(PROVIDER_POLL_MS))?
                .unwrap_or(defaults.provider_poll_interval_ms),
            runtime_profile: match get(RUNTIME_PROFILE) {
                None => defaults.runtime_profile,
                Some(raw) => match raw.to_ascii_lowercase().as_str() {
                    "development" | "dev" => RuntimeProfile::Development,
                    "production" | "prod" => RuntimeProfile::Production,
                    _ => return Err(ConfigError::InvalidProfile(raw)),
                },
            },
            start_page: get(START_PAGE),
        })
    }

    pub fn network_settings(&self) -> NetworkSettings {
        NetworkSettings {
            eth_network_id: self.eth_network_id,
            arb_network_id: self.arb_network_id,
        }
    }

    pub fn remote_endpoints(&self) -> RemoteEndpoints {
        RemoteEndpoints {
            eth_node_url: self.eth_node_url.clone(),
            arb_validator_url: self.arb_validator_url.clone(),
        }
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn info_requested(&self) -> bool {
        self.start_page.as_deref() == Some(INFO_PAGE_HASH)
    }
}

fn parse_network_id(
    var: &'static str,
    raw: Option<String>,
) -> Result<Option<NetworkId>, ConfigError> {
    raw.map(|raw| NetworkId::parse(&raw))
        .transpose()
        .map_err(|source| ConfigError::InvalidNetworkId { var, source })
}

fn parse_u64(var: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value })
    })
    .transpose()
}

#[cfg(target_arch = "wasm32")]
fn compile_time_env(key: &str) -> Option<String> {
    let value = match key {
        ETH_NETWORK_ID => option_env!("ARB_BRIDGE_ETH_NETWORK_ID"),
        ARB_NETWORK_ID => option_env!("ARB_BRIDGE_ARB_NETWORK_ID"),
        ETH_NODE_URL => option_env!("ARB_BRIDGE_ETH_NODE_URL"),
        ARB_VALIDATOR_URL => option_env!("ARB_BRIDGE_ARB_VALIDATOR_URL"),
        RPC_TIMEOUT_MS => option_env!("ARB_BRIDGE_RPC_TIMEOUT_MS"),
        PROVIDER_POLL_MS => option_env!("ARB_BRIDGE_PROVIDER_POLL_MS"),
        RUNTIME_PROFILE => option_env!("ARB_BRIDGE_RUNTIME_PROFILE"),
        _ => None,
    };
    value.map(str::to_owned)
}
