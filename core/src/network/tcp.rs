use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use async_trait::async_trait;
use proxyscout_common::candidate::PortState;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::ports::PortProber;

/// Full TCP handshake against the proxy port, bounded by `timeout`.
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PortProber for TcpProber {
    async fn probe(&self, addr: Ipv4Addr, port: u16) -> PortState {
        handshake_probe(SocketAddrV4::new(addr, port), self.timeout).await
    }
}

pub async fn handshake_probe(socket_addr: SocketAddrV4, probe_timeout: Duration) -> PortState {
    let state = bounded_connect(TcpStream::connect(socket_addr), probe_timeout).await;
    trace!("{socket_addr}: {state:?}");
    state
}

/// Maps the outcome of `connect`, cut off after `probe_timeout`.
async fn bounded_connect<F, S>(connect: F, probe_timeout: Duration) -> PortState
where
    F: Future<Output = std::io::Result<S>>,
{
    match timeout(probe_timeout, connect).await {
        Ok(Ok(_stream)) => PortState::Open,
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => PortState::Refused,
        Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => PortState::TimedOut,
        Ok(Err(e)) => PortState::Unreachable(e.to_string()),
        Err(_elapsed) => PortState::TimedOut,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
