pub mod config;
pub mod eip1193;
pub mod json_rpc;

pub use config::{BridgeEnvConfig, ConfigError, RuntimeProfile};
pub use eip1193::InjectedAdapter;
pub use json_rpc::{HttpRemoteFactory, JsonRpcAdapter};
