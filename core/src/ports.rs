//! # Outbound Ports
//!
//! Contracts for everything the discovery run asks of the outside world:
//! the OS interface table, the link layer, TCP, HTTP and the OS proxy
//! settings.
//!
//! ## Rules
//! 1. All items here are traits.
//! 2. Concrete implementations live in [`crate::network`], [`crate::scanner`]
//!    and [`crate::system`].
//! 3. The orchestrator in [`crate::discovery`] depends on these traits only,
//!    which keeps it platform independent and lets tests swap in fakes.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use async_trait::async_trait;
use proxyscout_common::candidate::{PortState, Verdict};
use proxyscout_common::network::interface::ResolveError;
use proxyscout_common::network::prefix::LocalNetwork;

use crate::network::http::ValidateError;
use crate::system::{ConfigureError, ProxyCommand};

/// Finds the interface, address and /24 a run scans from.
pub trait NetworkResolver: Send + Sync {
    fn resolve(&self) -> Result<LocalNetwork, ResolveError>;
}

/// Finds live hosts on the local /24.
#[async_trait]
pub trait HostDiscoverer: Send + Sync {
    /// Returns every host that answered within `timeout`, possibly none.
    async fn discover(&self, network: &LocalNetwork, timeout: Duration)
    -> anyhow::Result<Vec<Ipv4Addr>>;
}

/// Checks whether a TCP port accepts connections.
#[async_trait]
pub trait PortProber: Send + Sync {
    async fn probe(&self, addr: Ipv4Addr, port: u16) -> PortState;
}

/// Checks whether an open port is a working HTTP proxy.
#[async_trait]
pub trait ProxyValidator: Send + Sync {
    async fn validate(&self, proxy: SocketAddrV4) -> Result<Verdict, ValidateError>;
}

/// Writes the proxy into the OS settings, or clears it when `proxy` is `None`.
#[async_trait]
pub trait ProxyConfigurator: Send + Sync {
    async fn apply(&self, proxy: Option<SocketAddrV4>) -> Result<(), ConfigureError>;
}

/// Runs one OS command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ProxyCommand) -> Result<(), ConfigureError>;
}
