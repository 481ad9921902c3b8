use std::net::Ipv4Addr;

use anyhow::{Context, ensure};
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::util::MacAddr;

use crate::network::ethernet::{self, ETH_HDR_LEN, MIN_ETH_FRAME_NO_FCS};

pub const ARP_LEN: usize = 28;

/// Builds a broadcast ARP request asking who holds `dst_addr`.
pub fn create_request(
    src_mac: MacAddr,
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
) -> anyhow::Result<Vec<u8>> {
    let mut buffer = [0u8; MIN_ETH_FRAME_NO_FCS];
    ethernet::make_header(&mut buffer, src_mac, MacAddr::broadcast(), EtherTypes::Arp)?;
    let mut arp_packet = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..ETH_HDR_LEN + ARP_LEN])
        .context("failed to create mutable ARP packet")?;
    arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp_packet.set_protocol_type(EtherTypes::Ipv4);
    arp_packet.set_hw_addr_len(6);
    arp_packet.set_proto_addr_len(4);
    arp_packet.set_operation(ArpOperations::Request);
    arp_packet.set_sender_hw_addr(src_mac);
    arp_packet.set_target_hw_addr(MacAddr::zero());
    arp_packet.set_sender_proto_addr(src_addr);
    arp_packet.set_target_proto_addr(dst_addr);
    Ok(Vec::from(buffer))
}

/// Extracts the responder's address from an ARP reply addressed to `local_addr`.
pub fn get_reply_sender(frame: &[u8], local_addr: Ipv4Addr) -> anyhow::Result<Ipv4Addr> {
    let eth_packet = EthernetPacket::new(frame).context("truncated Ethernet frame")?;
    ensure!(
        eth_packet.get_ethertype() == EtherTypes::Arp,
        "not an ARP frame ({:?})",
        eth_packet.get_ethertype()
    );
    let arp_packet = ArpPacket::new(eth_packet.payload()).context(format!(
        "truncated or invalid ARP packet (payload len {})",
        eth_packet.payload().len()
    ))?;
    ensure!(
        arp_packet.get_operation() == ArpOperations::Reply,
        "ARP packet is not a reply"
    );
    ensure!(
        arp_packet.get_target_proto_addr() == local_addr,
        "ARP reply addressed to {}",
        arp_packet.get_target_proto_addr()
    );
    Ok(arp_packet.get_sender_proto_addr())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
