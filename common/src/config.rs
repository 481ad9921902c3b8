//! # Run Configuration
//!
//! Every tunable of a run lives in [`Config`]. It is read once from the
//! process environment at startup and then handed, immutable, to each
//! component.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_PROXY_PORT: u16 = 7890;
pub const DEFAULT_INTERFACE: &str = "en0";
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_WORKERS: usize = 10;
pub const DEFAULT_TEST_URL: &str = "http://www.gstatic.com/generate_204";
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_NETWORK_SERVICE: &str = "Wi-Fi";
/// Largest accepted `MAX_WORKERS`. A /24 never has more than 254 hosts to check.
pub const MAX_WORKERS_LIMIT: usize = 1024;

/// Interface name that asks the resolver to pick the best LAN interface itself.
pub const AUTO_INTERFACE: &str = "auto";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("MAX_WORKERS must be at least 1")]
    NoWorkers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the Clash listener is expected on. Probed, validated and installed.
    pub proxy_port: u16,
    /// Interface whose IPv4 /24 gets scanned, or [`AUTO_INTERFACE`].
    pub interface: String,
    /// How long ARP replies are collected for.
    pub scan_timeout: Duration,
    /// Upper bound on hosts probed and validated at the same time.
    pub max_workers: usize,
    pub test_url: Url,
    pub test_timeout: Duration,
    pub port_timeout: Duration,
    /// macOS network service passed to `networksetup`.
    pub network_service: String,
    /// Prints the underlying error text of failures.
    pub debug: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The configuration of an empty environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_lookup(|_| None)
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Missing or blank keys fall back to their defaults, malformed ones are
    /// rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let proxy_port = match get("PROXY_PORT") {
            Some(value) => parse_number("PROXY_PORT", &value, "a port number")?,
            None => DEFAULT_PROXY_PORT,
        };
        let max_workers = match get("MAX_WORKERS") {
            Some(value) => parse_number("MAX_WORKERS", &value, "a positive integer")?,
            None => DEFAULT_MAX_WORKERS,
        };
        if max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if max_workers > MAX_WORKERS_LIMIT {
            return Err(ConfigError::Invalid {
                key: "MAX_WORKERS",
                value: max_workers.to_string(),
                expected: "at most 1024",
            });
        }

        let test_url = get("PROXY_TEST_URL").unwrap_or_else(|| DEFAULT_TEST_URL.to_string());
        let test_url = Url::parse(&test_url).map_err(|_| ConfigError::Invalid {
            key: "PROXY_TEST_URL",
            value: test_url.clone(),
            expected: "an absolute URL",
        })?;

        Ok(Self {
            proxy_port,
            interface: get("NETWORK_INTERFACE").unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            scan_timeout: parse_secs(get("SCAN_TIMEOUT"), "SCAN_TIMEOUT", DEFAULT_SCAN_TIMEOUT)?,
            max_workers,
            test_url,
            test_timeout: parse_secs(
                get("PROXY_TEST_TIMEOUT"),
                "PROXY_TEST_TIMEOUT",
                DEFAULT_TEST_TIMEOUT,
            )?,
            port_timeout: parse_secs(
                get("PORT_CHECK_TIMEOUT"),
                "PORT_CHECK_TIMEOUT",
                DEFAULT_PORT_TIMEOUT,
            )?,
            network_service: get("NETWORK_SERVICE")
                .unwrap_or_else(|| DEFAULT_NETWORK_SERVICE.to_string()),
            debug: get("DEBUG").is_some_and(|value| value.eq_ignore_ascii_case("true")),
        })
    }
}

pub fn is_auto_interface(name: &str) -> bool {
    name.eq_ignore_ascii_case(AUTO_INTERFACE)
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
        expected,
    })
}

fn parse_secs(
    value: Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => {
            let secs: u64 = parse_number(key, &value, "a whole number of seconds")?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(default),
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
