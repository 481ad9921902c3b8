//! Per-host outcomes of the probe and validation steps.
//!
//! Network failures are kept as values here instead of collapsing into
//! `false`, so callers can tell a closed port from a broken probe.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortState {
    Open,
    Refused,
    TimedOut,
    Unreachable(String),
}

impl PortState {
    pub fn is_open(&self) -> bool {
        matches!(self, PortState::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The request went through the proxy and came back `204 No Content`.
    Valid,
    UnexpectedStatus(u16),
    TimedOut,
    Transport(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "answered 204"),
            Verdict::UnexpectedStatus(code) => write!(f, "answered {code} instead of 204"),
            Verdict::TimedOut => write!(f, "timed out"),
            Verdict::Transport(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

/// One scanned host. `verdict` is only present when the port was open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub addr: Ipv4Addr,
    pub port: u16,
    pub port_state: PortState,
    pub verdict: Option<Verdict>,
}

impl Candidate {
    pub fn new(addr: Ipv4Addr, port: u16, port_state: PortState) -> Self {
        Self {
            addr,
            port,
            port_state,
            verdict: None,
        }
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.addr, self.port)
    }

    pub fn is_proxy(&self) -> bool {
        self.port_state.is_open() && self.verdict.as_ref().is_some_and(Verdict::is_valid)
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

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 2);

    #[test]
    fn candidate_needs_open_port_and_valid_verdict() {
        let closed = Candidate::new(ADDR, 7890, PortState::Refused);
        assert!(!closed.is_proxy());

        let unverified = Candidate::new(ADDR, 7890, PortState::Open);
        assert!(!unverified.is_proxy());

        let rejected = Candidate::new(ADDR, 7890, PortState::Open)
            .with_verdict(Verdict::UnexpectedStatus(407));
        assert!(!rejected.is_proxy());

        let proxy = Candidate::new(ADDR, 7890, PortState::Open).with_verdict(Verdict::Valid);
        assert!(proxy.is_proxy());
        assert_eq!(proxy.socket_addr().to_string(), "192.168.1.2:7890");
    }

    #[test]
    fn verdict_display_names_the_status() {
        assert_eq!(
            Verdict::UnexpectedStatus(200).to_string(),
            "answered 200 instead of 204"
        );
    }
}
