use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use colored::*;
use is_root::is_root;
use tracing::{error, info, warn};

use proxyscout_common::config::Config;
use proxyscout_common::success;
use proxyscout_core::discovery::{DiscoveryService, Mode, RunOutcome, RunReport, ScanReport};

use crate::terminal::{colors, print};

pub async fn run(mode: Mode, cfg: Arc<Config>) -> ExitCode {
    if mode == Mode::Discover {
        print_settings(&cfg);
        if !is_root() {
            warn!("Not running as root, the ARP scan will most likely see nothing");
        }
    }

    let service = DiscoveryService::from_config(Arc::clone(&cfg));
    match service.run(mode).await {
        Ok(report) => {
            run_ends(&report, &cfg);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            report_cause(&e, cfg.debug);
            ExitCode::FAILURE
        }
    }
}

fn print_settings(cfg: &Config) {
    print::header("getting ready for discovery");
    print::set_key_width(["Interface", "Port", "Workers", "Test URL"]);
    print::aligned_line("Interface", cfg.interface.as_str());
    print::aligned_line("Port", cfg.proxy_port.to_string());
    print::aligned_line("Workers", cfg.max_workers.to_string());
    print::aligned_line("Test URL", cfg.test_url.as_str());
}

fn report_cause(e: &dyn Error, debug: bool) {
    let Some(mut source) = e.source() else {
        return;
    };
    if !debug {
        info!("Set DEBUG=true to see the underlying error");
        return;
    }
    loop {
        error!("Caused by: {source}");
        match source.source() {
            Some(next) => source = next,
            None => break,
        }
    }
}

fn run_ends(report: &RunReport, cfg: &Config) {
    match &report.outcome {
        RunOutcome::Cleared => {}
        RunOutcome::NoHosts => {
            print::header("zero hosts detected");
            print::no_results();
        }
        RunOutcome::NoProxyFound => {
            print::header("no proxy found");
            print::no_results();
            print_summary(&report.scan, cfg);
        }
        RunOutcome::Configured(proxy) => {
            print::header("proxy configured");
            for other in report.scan.proxies().filter(|p| p != proxy) {
                info!("Also answering: {other}");
            }
            print_summary(&report.scan, cfg);
        }
    }
}

fn print_summary(scan: &ScanReport, cfg: &Config) {
    let hosts = format!("{} hosts", scan.hosts.len()).bold().green();
    let open = format!("{} open on {}", scan.open_ports(), cfg.proxy_port).bold().green();
    let output = format!(
        "Scan Complete: {hosts}, {open} in {}",
        elapsed(scan.elapsed)
    )
    .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
    if let Some(proxy) = scan.proxies().next() {
        success!("Using {}", proxy.to_string().color(colors::ACCENT));
    }
}

fn elapsed(total: Duration) -> ColoredString {
    format!("{:.2}s", total.as_secs_f64()).bold().yellow()
}
