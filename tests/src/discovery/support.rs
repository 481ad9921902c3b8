//! Fakes for the outbound ports and small socket helpers.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proxyscout_common::candidate::{PortState, Verdict};
use proxyscout_common::config::Config;
use proxyscout_common::network::interface::ResolveError;
use proxyscout_common::network::prefix::LocalNetwork;
use proxyscout_core::network::http::ValidateError;
use proxyscout_core::ports::{
    CommandRunner, HostDiscoverer, NetworkResolver, PortProber, ProxyConfigurator, ProxyValidator,
};
use proxyscout_core::system::{ConfigureError, ProxyCommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const LOCAL: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

pub fn config(pairs: &[(&str, String)]) -> Arc<Config> {
    let cfg = Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap();
    Arc::new(cfg)
}

pub struct LoopbackResolver;

impl NetworkResolver for LoopbackResolver {
    fn resolve(&self) -> Result<LocalNetwork, ResolveError> {
        Ok(LocalNetwork::new("lo", None, LOCAL))
    }
}

#[derive(Clone, Default)]
pub struct StaticHosts {
    hosts: Vec<Ipv4Addr>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StaticHosts {
    pub fn new(hosts: Vec<Ipv4Addr>) -> Self {
        Self {
            hosts,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostDiscoverer for StaticHosts {
    async fn discover(&self, _: &LocalNetwork, _: Duration) -> anyhow::Result<Vec<Ipv4Addr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("no permission to open a datalink channel");
        }
        Ok(self.hosts.clone())
    }
}

/// Wraps a real prober and remembers every host it was asked about.
pub struct CountingProber<P> {
    inner: Arc<P>,
    pub probed: Arc<Mutex<Vec<Ipv4Addr>>>,
}

impl<P> CountingProber<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            probed: Arc::default(),
        }
    }
}

impl<P> Clone for CountingProber<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            probed: Arc::clone(&self.probed),
        }
    }
}

#[async_trait]
impl<P: PortProber> PortProber for CountingProber<P> {
    async fn probe(&self, addr: Ipv4Addr, port: u16) -> PortState {
        self.probed.lock().unwrap().push(addr);
        self.inner.probe(addr, port).await
    }
}

/// Wraps a real validator and remembers every proxy it was asked about.
pub struct CountingValidator<V> {
    inner: Arc<V>,
    pub validated: Arc<Mutex<Vec<SocketAddrV4>>>,
}

impl<V> CountingValidator<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner: Arc::new(inner),
            validated: Arc::default(),
        }
    }
}

impl<V> Clone for CountingValidator<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            validated: Arc::clone(&self.validated),
        }
    }
}

#[async_trait]
impl<V: ProxyValidator> ProxyValidator for CountingValidator<V> {
    async fn validate(&self, proxy: SocketAddrV4) -> Result<Verdict, ValidateError> {
        self.validated.lock().unwrap().push(proxy);
        self.inner.validate(proxy).await
    }
}

#[derive(Clone, Default)]
pub struct RecordingConfigurator {
    pub applied: Arc<Mutex<Vec<Option<SocketAddrV4>>>>,
}

#[async_trait]
impl ProxyConfigurator for RecordingConfigurator {
    async fn apply(&self, proxy: Option<SocketAddrV4>) -> Result<(), ConfigureError> {
        self.applied.lock().unwrap().push(proxy);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingRunner {
    pub ran: Arc<Mutex<Vec<ProxyCommand>>>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &ProxyCommand) -> Result<(), ConfigureError> {
        self.ran.lock().unwrap().push(command.clone());
        Ok(())
    }
}

/// Binds an HTTP responder on `addr` that answers every request with
/// `status_line`, the way a proxy relaying the test URL would.
pub async fn spawn_fake_proxy(addr: SocketAddrV4, status_line: &'static str) -> SocketAddrV4 {
    let listener = TcpListener::bind(addr).await.unwrap();
    let bound = match listener.local_addr().unwrap() {
        std::net::SocketAddr::V4(v4) => v4,
        other => panic!("expected an IPv4 listener, got {other}"),
    };
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response =
                    format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    bound
}
