use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};

use proxyscout_common::config::Config;
use proxyscout_core::discovery::{DiscoveryService, Mode, RunOutcome};
use proxyscout_core::network::http::HttpValidator;
use proxyscout_core::network::tcp::TcpProber;
use proxyscout_core::ports::{PortProber, ProxyValidator};
use proxyscout_core::system::{OsFamily, SystemProxy, clear_plan};
use tokio::net::TcpListener;

use super::support::*;

/// A port on `addr` that nothing listens on.
async fn closed_port(addr: Ipv4Addr) -> u16 {
    let listener = TcpListener::bind(SocketAddrV4::new(addr, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

fn real_stack(cfg: &Config) -> (CountingProber<TcpProber>, CountingValidator<HttpValidator>) {
    (
        CountingProber::new(TcpProber::new(cfg.port_timeout)),
        CountingValidator::new(HttpValidator::new(cfg.test_url.clone(), cfg.test_timeout)),
    )
}

fn settings(port: u16) -> Vec<(&'static str, String)> {
    vec![
        ("PROXY_PORT", port.to_string()),
        ("PROXY_TEST_URL", "http://proxyscout.test/generate_204".to_string()),
        ("PROXY_TEST_TIMEOUT", "2".to_string()),
        ("PORT_CHECK_TIMEOUT", "1".to_string()),
        ("MAX_WORKERS", "2".to_string()),
    ]
}

/// A has nothing listening, B answers 200, C answers 204. Only C may be
/// installed, and only once. Relies on the whole of 127/8 being loopback.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn valid_proxy_is_selected_among_closed_and_rejecting_hosts() {
    let a = Ipv4Addr::new(127, 0, 0, 2);
    let b = Ipv4Addr::new(127, 0, 0, 3);
    let c = Ipv4Addr::new(127, 0, 0, 4);

    let proxy_c = spawn_fake_proxy(SocketAddrV4::new(c, 0), "204 No Content").await;
    let port = proxy_c.port();
    spawn_fake_proxy(SocketAddrV4::new(b, port), "200 OK").await;

    let cfg = config(&settings(port));
    let (prober, validator) = real_stack(&cfg);
    let configurator = RecordingConfigurator::default();
    let service = DiscoveryService::new(
        Arc::clone(&cfg),
        Box::new(LoopbackResolver),
        Box::new(StaticHosts::new(vec![a, b, c])),
        Arc::new(prober.clone()),
        Arc::new(validator.clone()),
        Box::new(configurator.clone()),
    );

    let report = service.run(Mode::Discover).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Configured(proxy_c));
    assert_eq!(*configurator.applied.lock().unwrap(), vec![Some(proxy_c)]);
    assert_eq!(report.scan.open_ports(), 2);

    let mut probed = prober.probed.lock().unwrap().clone();
    probed.sort();
    assert_eq!(probed, vec![a, b, c]);

    let validated = validator.validated.lock().unwrap().clone();
    assert!(!validated.contains(&SocketAddrV4::new(a, port)));
    assert_eq!(validated.len(), 2);
}

#[tokio::test]
async fn closed_port_is_never_validated() {
    let port = closed_port(LOCAL).await;
    let cfg = config(&settings(port));
    let (prober, validator) = real_stack(&cfg);
    let configurator = RecordingConfigurator::default();
    let service = DiscoveryService::new(
        Arc::clone(&cfg),
        Box::new(LoopbackResolver),
        Box::new(StaticHosts::new(vec![LOCAL])),
        Arc::new(prober.clone()),
        Arc::new(validator.clone()),
        Box::new(configurator.clone()),
    );

    let report = service.run(Mode::Discover).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoProxyFound);
    assert_eq!(*prober.probed.lock().unwrap(), vec![LOCAL]);
    assert!(validator.validated.lock().unwrap().is_empty());
    assert!(configurator.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_hosts_never_reaches_the_configurator() {
    let cfg = config(&[]);
    let (prober, validator) = real_stack(&cfg);
    let configurator = RecordingConfigurator::default();
    let service = DiscoveryService::new(
        Arc::clone(&cfg),
        Box::new(LoopbackResolver),
        Box::new(StaticHosts::new(vec![])),
        Arc::new(prober.clone()),
        Arc::new(validator.clone()),
        Box::new(configurator.clone()),
    );

    let report = service.run(Mode::Discover).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoHosts);
    assert!(prober.probed.lock().unwrap().is_empty());
    assert!(configurator.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn discovery_error_ends_the_run_quietly() {
    let cfg = config(&[]);
    let (prober, validator) = real_stack(&cfg);
    let configurator = RecordingConfigurator::default();
    let discoverer = StaticHosts::failing();
    let service = DiscoveryService::new(
        Arc::clone(&cfg),
        Box::new(LoopbackResolver),
        Box::new(discoverer.clone()),
        Arc::new(prober.clone()),
        Arc::new(validator.clone()),
        Box::new(configurator.clone()),
    );

    let report = service.run(Mode::Discover).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoHosts);
    assert_eq!(discoverer.calls(), 1);
    assert!(prober.probed.lock().unwrap().is_empty());
    assert!(validator.validated.lock().unwrap().is_empty());
    assert!(configurator.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn clear_mode_skips_discovery_and_repeats_the_same_plan() {
    let cfg = config(&[]);
    let (prober, validator) = real_stack(&cfg);
    let discoverer = StaticHosts::new(vec![LOCAL]);
    let runner = RecordingRunner::default();
    let service = DiscoveryService::new(
        Arc::clone(&cfg),
        Box::new(LoopbackResolver),
        Box::new(discoverer.clone()),
        Arc::new(prober.clone()),
        Arc::new(validator),
        Box::new(SystemProxy::with_runner(OsFamily::MacOs, "Wi-Fi", runner.clone())),
    );

    let first = service.run(Mode::Clear).await.unwrap();
    let first_plan = std::mem::take(&mut *runner.ran.lock().unwrap());
    let second = service.run(Mode::Clear).await.unwrap();
    let second_plan = runner.ran.lock().unwrap().clone();

    assert_eq!(first.outcome, RunOutcome::Cleared);
    assert_eq!(second.outcome, RunOutcome::Cleared);
    assert_eq!(first_plan, second_plan);
    assert_eq!(first_plan, clear_plan(OsFamily::MacOs, "Wi-Fi").unwrap());
    assert_eq!(discoverer.calls(), 0);
    assert!(prober.probed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn prober_reports_closed_port_within_its_timeout() {
    let port = closed_port(LOCAL).await;
    let timeout = Duration::from_secs(1);

    let start = Instant::now();
    let state = TcpProber::new(timeout).probe(LOCAL, port).await;

    assert!(!state.is_open());
    assert!(start.elapsed() < timeout + Duration::from_millis(500));
}

#[tokio::test]
async fn open_port_that_is_not_a_proxy_is_rejected() {
    let listener = TcpListener::bind(SocketAddrV4::new(LOCAL, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        // Accept and hang up without a word, like a non-HTTP service.
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let cfg = config(&settings(port));
    let validator = HttpValidator::new(cfg.test_url.clone(), cfg.test_timeout);
    let verdict = validator.validate(SocketAddrV4::new(LOCAL, port)).await.unwrap();

    assert!(!verdict.is_valid());
}

#[tokio::test]
async fn proxy_answering_204_is_accepted() {
    let proxy = spawn_fake_proxy(SocketAddrV4::new(LOCAL, 0), "204 No Content").await;
    let cfg = config(&settings(proxy.port()));
    let validator = HttpValidator::new(cfg.test_url.clone(), cfg.test_timeout);

    assert!(validator.validate(proxy).await.unwrap().is_valid());
}
