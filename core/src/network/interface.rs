use proxyscout_common::network::interface::{self, ResolveError};
use proxyscout_common::network::prefix::LocalNetwork;

use crate::ports::NetworkResolver;

/// Resolves the configured interface against the live OS interface table.
pub struct InterfaceResolver {
    interface: String,
}

impl InterfaceResolver {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl NetworkResolver for InterfaceResolver {
    fn resolve(&self) -> Result<LocalNetwork, ResolveError> {
        interface::resolve_local_network(&self.interface)
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
