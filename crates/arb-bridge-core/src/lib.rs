pub mod bridge;
pub mod domain;
pub mod ports;
pub mod resolver;
pub mod signer;

pub use bridge::BridgeConfig;
pub use domain::{BridgeMode, ChainRole, ConnectionState, NetworkId, NetworkSettings};
pub use ports::{
    parse_accounts, InjectedPort, PortError, PortFuture, ProviderEvent, ProviderEventKind,
    ProviderKind, ProviderPort, RemoteFactory,
};
pub use resolver::{needs_reload, RemoteEndpoints, Resolution, ResolveError, Resolver};
pub use signer::{Signer, SignerLocator};
