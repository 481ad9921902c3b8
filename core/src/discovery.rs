//! # Proxy Discovery Service
//!
//! Implements the two use cases of a run: finding a proxy on the local /24
//! and installing it, or clearing the system proxy.
//!
//! The service only talks to the traits in [`crate::ports`]; which scanner,
//! prober or configurator sits behind them is decided by the caller.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};

use proxyscout_common::candidate::Candidate;
use proxyscout_common::config::Config;
use proxyscout_common::network::interface::ResolveError;
use proxyscout_common::success;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::network::http::HttpValidator;
use crate::network::interface::InterfaceResolver;
use crate::network::tcp::TcpProber;
use crate::ports::{HostDiscoverer, NetworkResolver, PortProber, ProxyConfigurator, ProxyValidator};
use crate::scanner::LocalScanner;
use crate::system::{ConfigureError, SystemProxy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Discover,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Cleared,
    Configured(SocketAddrV4),
    NoHosts,
    NoProxyFound,
}

/// What a discovery run saw along the way.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub hosts: Vec<Ipv4Addr>,
    /// Per-host results in the order the workers finished.
    pub candidates: Vec<Candidate>,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn open_ports(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.port_state.is_open())
            .count()
    }

    pub fn proxies(&self) -> impl Iterator<Item = SocketAddrV4> + '_ {
        self.candidates
            .iter()
            .filter(|c| c.is_proxy())
            .map(Candidate::socket_addr)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub scan: ScanReport,
}

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("could not determine the local network")]
    Resolve(#[from] ResolveError),
    #[error("could not update the system proxy settings")]
    Configure(#[from] ConfigureError),
}

/// Application service that wires discovery, probing, validation and the
/// system proxy together.
pub struct DiscoveryService {
    cfg: Arc<Config>,
    resolver: Box<dyn NetworkResolver>,
    discoverer: Box<dyn HostDiscoverer>,
    prober: Arc<dyn PortProber>,
    validator: Arc<dyn ProxyValidator>,
    configurator: Box<dyn ProxyConfigurator>,
}

impl DiscoveryService {
    pub fn new(
        cfg: Arc<Config>,
        resolver: Box<dyn NetworkResolver>,
        discoverer: Box<dyn HostDiscoverer>,
        prober: Arc<dyn PortProber>,
        validator: Arc<dyn ProxyValidator>,
        configurator: Box<dyn ProxyConfigurator>,
    ) -> Self {
        Self {
            cfg,
            resolver,
            discoverer,
            prober,
            validator,
            configurator,
        }
    }

    /// Builds the service on top of the real OS facing implementations.
    pub fn from_config(cfg: Arc<Config>) -> Self {
        Self::new(
            Arc::clone(&cfg),
            Box::new(InterfaceResolver::new(cfg.interface.clone())),
            Box::new(LocalScanner),
            Arc::new(TcpProber::new(cfg.port_timeout)),
            Arc::new(HttpValidator::new(cfg.test_url.clone(), cfg.test_timeout)),
            Box::new(SystemProxy::new(cfg.network_service.clone())),
        )
    }

    pub async fn run(&self, mode: Mode) -> Result<RunReport, ScoutError> {
        match mode {
            Mode::Clear => self.clear().await,
            Mode::Discover => self.discover().await,
        }
    }

    async fn clear(&self) -> Result<RunReport, ScoutError> {
        info!("Clearing system proxy settings");
        self.configurator.apply(None).await?;
        success!("System proxy cleared");
        Ok(RunReport {
            outcome: RunOutcome::Cleared,
            scan: ScanReport::default(),
        })
    }

    async fn discover(&self) -> Result<RunReport, ScoutError> {
        let start = Instant::now();
        let network = self.resolver.resolve()?;
        info!(
            "Scanning {}.0/24 from {} ({})",
            network.prefix(),
            network.addr,
            network.interface
        );

        let span = info_span!("Looking for live hosts", indicatif.pb_show = true);
        let hosts = match self
            .discoverer
            .discover(&network, self.cfg.scan_timeout)
            .instrument(span)
            .await
        {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!("Host discovery failed, treating the network as empty");
                debug!("{e:#}");
                Vec::new()
            }
        };

        let mut scan = ScanReport {
            hosts,
            ..Default::default()
        };
        if scan.hosts.is_empty() {
            info!("No active hosts found");
            scan.elapsed = start.elapsed();
            return Ok(RunReport {
                outcome: RunOutcome::NoHosts,
                scan,
            });
        }
        info!("Found {} active hosts", scan.hosts.len());

        let span = info_span!("Checking hosts for a proxy", indicatif.pb_show = true);
        scan.candidates = self.check_hosts(&scan.hosts).instrument(span).await;
        scan.elapsed = start.elapsed();

        let Some(proxy) = scan.proxies().next() else {
            info!("No working proxy on port {}", self.cfg.proxy_port);
            return Ok(RunReport {
                outcome: RunOutcome::NoProxyFound,
                scan,
            });
        };

        success!("Proxy found at {proxy}");
        self.configurator.apply(Some(proxy)).await?;
        success!("System proxy set to {proxy}");

        Ok(RunReport {
            outcome: RunOutcome::Configured(proxy),
            scan,
        })
    }

    /// Probes and validates every host, at most `max_workers` at a time.
    /// Results come back in completion order.
    async fn check_hosts(&self, hosts: &[Ipv4Addr]) -> Vec<Candidate> {
        let workers_needed = self.cfg.max_workers.min(hosts.len()).max(1);
        let permits = Arc::new(Semaphore::new(workers_needed));
        let mut workers = JoinSet::new();

        for &addr in hosts {
            let permits = Arc::clone(&permits);
            let prober = Arc::clone(&self.prober);
            let validator = Arc::clone(&self.validator);
            let port = self.cfg.proxy_port;

            workers.spawn(async move {
                let _permit = permits.acquire().await.ok();
                check_host(addr, port, prober.as_ref(), validator.as_ref()).await
            });
        }

        let mut candidates = Vec::with_capacity(hosts.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => debug!("Host check aborted: {e}"),
            }
        }
        candidates
    }
}

async fn check_host(
    addr: Ipv4Addr,
    port: u16,
    prober: &dyn PortProber,
    validator: &dyn ProxyValidator,
) -> Candidate {
    let port_state = prober.probe(addr, port).await;
    let candidate = Candidate::new(addr, port, port_state);
    if !candidate.port_state.is_open() {
        trace!("{addr}:{port} is {:?}", candidate.port_state);
        return candidate;
    }

    info!("{addr}:{port} is open, validating");
    match validator.validate(candidate.socket_addr()).await {
        Ok(verdict) => {
            if !verdict.is_valid() {
                trace!("{addr}:{port} {verdict}");
            }
            candidate.with_verdict(verdict)
        }
        Err(e) => {
            debug!("{e}");
            candidate
        }
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
