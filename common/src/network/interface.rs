use pnet::datalink::{self, NetworkInterface};
use thiserror::Error;
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};
#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback_impl::{is_physical, is_wireless};

use crate::config;
use crate::network::prefix::LocalNetwork;
use crate::utils::interface::NetworkInterfaceExtension;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("interface '{name}' not found (available: {})", available.join(", "))]
    InterfaceNotFound { name: String, available: Vec<String> },
    #[error("interface '{name}' has no IPv4 address")]
    NoIpv4Address { name: String },
    #[error("no interface available for LAN discovery")]
    NoLanInterface,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no private IPv4 address to sweep.
    NoValidLanIp,
}

/// Resolves the interface a scan should run from.
///
/// `name` is matched against the live interface list, so the returned address
/// is whatever is bound right now. [`config::AUTO_INTERFACE`] picks the
/// best LAN interface instead.
pub fn resolve_local_network(name: &str) -> Result<LocalNetwork, ResolveError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    if config::is_auto_interface(name) {
        let candidates: Vec<NetworkInterface> = interfaces
            .into_iter()
            .filter(|interface| is_viable_lan_interface(interface, is_physical).is_ok())
            .collect();
        let interface =
            select_best_lan_interface(candidates, is_wired).ok_or(ResolveError::NoLanInterface)?;
        return local_network_of(&interface);
    }

    let interface = find_named(&interfaces, name)?;
    local_network_of(interface)
}

/// Looks up a live interface by name, e.g. to open a datalink channel on it.
pub fn find_interface(name: &str) -> Result<NetworkInterface, ResolveError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    find_named(&interfaces, name).cloned()
}

fn find_named<'a>(
    interfaces: &'a [NetworkInterface],
    name: &str,
) -> Result<&'a NetworkInterface, ResolveError> {
    interfaces
        .iter()
        .find(|interface| matches_name(interface, name))
        .ok_or_else(|| ResolveError::InterfaceNotFound {
            name: name.to_string(),
            available: interfaces.iter().map(|i| i.name.clone()).collect(),
        })
}

// Windows names adapters by GUID, the human readable name is the description.
fn matches_name(interface: &NetworkInterface, name: &str) -> bool {
    interface.name == name || (cfg!(windows) && interface.description == name)
}

fn local_network_of(interface: &NetworkInterface) -> Result<LocalNetwork, ResolveError> {
    let addr = interface
        .get_primary_ipv4()
        .ok_or_else(|| ResolveError::NoIpv4Address {
            name: interface.name.clone(),
        })?;
    Ok(LocalNetwork::new(interface.name.clone(), interface.mac, addr))
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if !is_physical(interface) {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if !interface.has_private_ipv4() {
        return Err(ViabilityError::NoValidLanIp);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let wired = interfaces.iter().position(|interface| is_wired(interface));
    let idx = wired.unwrap_or(0);
    interfaces.into_iter().nth(idx)
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Runs `networksetup` once and caches which devices are hardware ports.
    fn get_hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            let mut wireless = HashSet::new();

            if let Ok(output) = Command::new("networksetup").arg("-listallhardwareports").output() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(device) = line.strip_prefix("Device: ") {
                        physical.insert(device.trim().to_string());
                    }
                }
            }

            for device in &physical {
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    wireless.insert(device.clone());
                }
            }

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        get_hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        get_hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback_impl {
    use super::*;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        !interface.is_loopback()
    }

    pub fn is_wireless(_interface: &NetworkInterface) -> bool {
        false
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
