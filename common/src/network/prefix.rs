//! # Local Network Model
//!
//! A [`LocalNetwork`] is the interface the scan runs from. Its [`NetworkPrefix`]
//! is the first three octets of the bound IPv4 address, and the /24 behind it
//! is what gets swept.

use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::network::range::Ipv4Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkPrefix([u8; 3]);

impl NetworkPrefix {
    pub fn of(addr: Ipv4Addr) -> Self {
        let [a, b, c, _] = addr.octets();
        Self([a, b, c])
    }

    /// Address `host` inside this prefix.
    pub fn address(&self, host: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, host)
    }

    /// The whole /24, network and broadcast addresses included.
    pub fn range(&self) -> Ipv4Range {
        Ipv4Range::new(self.address(0), self.address(u8::MAX))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        Self::of(addr) == *self
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNetwork {
    pub interface: String,
    pub mac: Option<MacAddr>,
    pub addr: Ipv4Addr,
}

impl LocalNetwork {
    pub fn new(interface: impl Into<String>, mac: Option<MacAddr>, addr: Ipv4Addr) -> Self {
        Self {
            interface: interface.into(),
            mac,
            addr,
        }
    }

    pub fn prefix(&self) -> NetworkPrefix {
        NetworkPrefix::of(self.addr)
    }

    /// Every address of the /24 except our own.
    pub fn targets(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.prefix().range().to_iter().filter(move |addr| *addr != self.addr)
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
