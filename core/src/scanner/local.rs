//! A **local area network (LAN)** scanner.
//!
//! Sweeps the /24 of the local interface with ARP requests and collects every
//! host that answers. This scanner requires **root privileges** to construct
//! and intercept raw Layer 2 frames.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use pnet::datalink::DataLinkReceiver;
use proxyscout_common::network::interface;
use proxyscout_common::network::prefix::LocalNetwork;
use tracing::{debug, trace};

use crate::network::{arp, channel};
use crate::ports::HostDiscoverer;

pub struct LocalScanner;

#[async_trait]
impl HostDiscoverer for LocalScanner {
    async fn discover(
        &self,
        network: &LocalNetwork,
        timeout: Duration,
    ) -> anyhow::Result<Vec<Ipv4Addr>> {
        let network = network.clone();
        tokio::task::spawn_blocking(move || sweep(&network, timeout))
            .await
            .context("ARP sweep task panicked")?
    }
}

fn sweep(network: &LocalNetwork, timeout: Duration) -> anyhow::Result<Vec<Ipv4Addr>> {
    let intf = interface::find_interface(&network.interface)?;
    let src_mac = network
        .mac
        .or(intf.mac)
        .with_context(|| format!("{} has no MAC address", intf.name))?;

    let (mut tx, mut rx) = channel::open(&intf)?;

    let targets: Vec<Ipv4Addr> = network.targets().collect();
    for target in &targets {
        let packet = arp::create_request(src_mac, network.addr, *target)?;
        if let Some(Err(e)) = tx.send_to(&packet, None) {
            return Err(e).with_context(|| format!("sending ARP request for {target}"));
        }
    }
    debug!("Sent {} ARP requests on {}", targets.len(), intf.name);

    let pending: HashSet<Ipv4Addr> = targets.into_iter().collect();
    Ok(listen_for_replies(rx.as_mut(), network, pending, timeout))
}

/// Collects reply senders until `timeout` elapses or every target has answered.
fn listen_for_replies(
    rx: &mut dyn DataLinkReceiver,
    network: &LocalNetwork,
    mut pending: HashSet<Ipv4Addr>,
    timeout: Duration,
) -> Vec<Ipv4Addr> {
    let prefix = network.prefix();
    let deadline = Instant::now() + timeout;
    let mut hosts: Vec<Ipv4Addr> = Vec::new();

    while Instant::now() < deadline && !pending.is_empty() {
        let Ok(frame) = rx.next() else {
            continue;
        };
        match arp::get_reply_sender(frame, network.addr) {
            Ok(sender) => {
                if prefix.contains(sender) && pending.remove(&sender) {
                    trace!("{sender} is alive");
                    hosts.push(sender);
                }
            }
            Err(e) => trace!("Ignoring frame: {e}"),
        }
    }
    hosts
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
