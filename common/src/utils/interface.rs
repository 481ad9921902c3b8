use std::net::Ipv4Addr;

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    /// The IPv4 address the interface is reachable on, private ranges first.
    fn get_primary_ipv4(&self) -> Option<Ipv4Addr>;
    fn has_private_ipv4(&self) -> bool;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    fn get_primary_ipv4(&self) -> Option<Ipv4Addr> {
        let addrs: Vec<Ipv4Addr> = self
            .get_ipv4_nets()
            .into_iter()
            .map(|net| net.ip())
            .filter(|ip| !ip.is_loopback() && !ip.is_unspecified())
            .collect();

        addrs
            .iter()
            .find(|ip| ip.is_private())
            .or_else(|| addrs.first())
            .copied()
    }

    fn has_private_ipv4(&self) -> bool {
        self.get_ipv4_nets().iter().any(|net| net.ip().is_private())
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
