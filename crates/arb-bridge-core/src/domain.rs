use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ports::PortError;

/// Network identifier as reported by `net_version` / `eth_chainId`.
///
/// Wallets report it either as a decimal string (`"42161"`) or as a
/// `0x`-prefixed quantity (`"0xa4b1"`); both parse to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl NetworkId {
    pub fn parse(raw: &str) -> Result<Self, PortError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PortError::Validation("network id is empty".to_owned()));
        }
        let value = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
                .map_err(|e| PortError::Validation(format!("invalid hex network id {raw}: {e}")))?
        } else {
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid network id {raw}: {e}")))?
        };
        Ok(Self(value))
    }

    /// JS numbers are doubles; only finite non-negative integers in range
    /// are network IDs.
    pub fn from_f64(value: f64) -> Result<Self, PortError> {
        // 2^64, the first double past u64::MAX.
        const LIMIT: f64 = 18_446_744_073_709_551_616.0;
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= LIMIT {
            return Err(PortError::Validation(format!("invalid numeric network id {value}")));
        }
        Ok(Self(value as u64))
    }

    /// Accepts the JSON shapes providers return: a number or a string.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PortError> {
        if let Some(n) = value.as_u64() {
            return Ok(Self(n));
        }
        if let Some(n) = value.as_f64() {
            return Self::from_f64(n);
        }
        let s = value
            .as_str()
            .ok_or_else(|| PortError::Validation("network id must be string or number".to_owned()))?;
        Self::parse(s)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of the bridge, decided by which network the wallet sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeMode {
    /// Wallet is on L1: funds move L1 -> rollup.
    Deposit,
    /// Wallet is on the rollup: funds move rollup -> L1.
    Withdraw,
}

impl BridgeMode {
    /// The side served by the injected wallet.
    pub fn injected_role(self) -> ChainRole {
        match self {
            BridgeMode::Deposit => ChainRole::L1,
            BridgeMode::Withdraw => ChainRole::L2,
        }
    }

    /// The side served by the remote JSON-RPC endpoint.
    pub fn remote_role(self) -> ChainRole {
        self.injected_role().other()
    }

    pub fn label(self) -> &'static str {
        match self {
            BridgeMode::Deposit => "Deposit",
            BridgeMode::Withdraw => "Withdraw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainRole {
    L1,
    L2,
}

impl ChainRole {
    pub fn other(self) -> Self {
        match self {
            ChainRole::L1 => ChainRole::L2,
            ChainRole::L2 => ChainRole::L1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChainRole::L1 => "Ethereum",
            ChainRole::L2 => "Arbitrum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Loading,
    NoWallet,
    WrongNetwork,
    DepositMode,
    WithdrawMode,
}

impl ConnectionState {
    pub fn mode(self) -> Option<BridgeMode> {
        match self {
            ConnectionState::DepositMode => Some(BridgeMode::Deposit),
            ConnectionState::WithdrawMode => Some(BridgeMode::Withdraw),
            _ => None,
        }
    }
}

impl From<BridgeMode> for ConnectionState {
    fn from(mode: BridgeMode) -> Self {
        match mode {
            BridgeMode::Deposit => ConnectionState::DepositMode,
            BridgeMode::Withdraw => ConnectionState::WithdrawMode,
        }
    }
}

/// The two network identifiers the bridge is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub eth_network_id: Option<NetworkId>,
    pub arb_network_id: Option<NetworkId>,
}

impl NetworkSettings {
    /// L1 is checked first, so identical IDs resolve to deposit mode.
    /// An unset ID never matches.
    pub fn classify(&self, observed: NetworkId) -> Option<BridgeMode> {
        if self.eth_network_id == Some(observed) {
            Some(BridgeMode::Deposit)
        } else if self.arb_network_id == Some(observed) {
            Some(BridgeMode::Withdraw)
        } else {
            None
        }
    }

    pub fn network_id(&self, role: ChainRole) -> Option<NetworkId> {
        match role {
            ChainRole::L1 => self.eth_network_id,
            ChainRole::L2 => self.arb_network_id,
        }
    }
}
