use std::time::Duration;

use anyhow::{Context, bail};
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};

const READ_TIMEOUT: Duration = Duration::from_millis(50);

pub type EthernetChannel = (Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>);

/// Opens a raw Ethernet channel on `intf`. Needs root or administrator rights.
pub fn open(intf: &NetworkInterface) -> anyhow::Result<EthernetChannel> {
    open_eth_channel(intf, &get_config(), datalink::channel)
}

fn open_eth_channel<F>(intf: &NetworkInterface, cfg: &Config, channel_opener: F) -> anyhow::Result<EthernetChannel>
where
    F: FnOnce(&NetworkInterface, Config) -> std::io::Result<Channel>,
{
    let ch: Channel = channel_opener(intf, *cfg)
        .with_context(|| format!("opening datalink channel on {}", intf.name))?;
    match ch {
        Channel::Ethernet(tx, rx) => Ok((tx, rx)),
        _ => bail!("non-ethernet channel for {}", intf.name),
    }
}

/// Short read timeout so the receive loop can notice its deadline.
fn get_config() -> Config {
    Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Default::default()
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
