//! # System Proxy Settings
//!
//! Installs or clears the OS-wide proxy by running the platform's own tools:
//! `networksetup` on macOS, `reg` on Windows and `gsettings` on GNOME
//! desktops.
//!
//! Every change is first expressed as a plan, an ordered list of
//! [`ProxyCommand`]s. The plan is then executed one command at a time and
//! stops at the first failure. Commands that already ran are not undone.

use std::fmt;
use std::net::SocketAddrV4;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::ports::{CommandRunner, ProxyConfigurator};

const WINDOWS_INTERNET_SETTINGS: &str =
    "HKCU\\Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings";
const GNOME_PROXY_SCHEMA: &str = "org.gnome.system.proxy";

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("system proxy configuration is not supported on {0}")]
    UnsupportedPlatform(&'static str),
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    MacOs,
    Windows,
    Linux,
    Other(&'static str),
}

impl OsFamily {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            "linux" => OsFamily::Linux,
            other => OsFamily::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl ProxyCommand {
    fn new<I, S>(program: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ProxyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Commands that point the web, secure web and SOCKS proxies at `proxy`.
pub fn install_plan(
    os: OsFamily,
    service: &str,
    proxy: SocketAddrV4,
) -> Result<Vec<ProxyCommand>, ConfigureError> {
    let host = proxy.ip().to_string();
    let port = proxy.port().to_string();

    let plan = match os {
        OsFamily::MacOs => {
            let set = |flag: &str| {
                ProxyCommand::new("networksetup", [flag, service, host.as_str(), port.as_str()])
            };
            let enable = |flag: &str| ProxyCommand::new("networksetup", [flag, service, "on"]);
            vec![
                set("-setwebproxy"),
                set("-setsecurewebproxy"),
                set("-setsocksfirewallproxy"),
                enable("-setwebproxystate"),
                enable("-setsecurewebproxystate"),
                enable("-setsocksfirewallproxystate"),
            ]
        }
        OsFamily::Windows => vec![
            registry_value("ProxyEnable", "REG_DWORD", "1"),
            registry_value("ProxyServer", "REG_SZ", &proxy.to_string()),
        ],
        OsFamily::Linux => {
            let mut plan = Vec::new();
            for scheme in ["http", "https", "socks"] {
                let schema = format!("{GNOME_PROXY_SCHEMA}.{scheme}");
                plan.push(ProxyCommand::new("gsettings", ["set", schema.as_str(), "host", host.as_str()]));
                plan.push(ProxyCommand::new("gsettings", ["set", schema.as_str(), "port", port.as_str()]));
            }
            plan.push(gnome_mode("manual"));
            plan
        }
        OsFamily::Other(name) => return Err(ConfigureError::UnsupportedPlatform(name)),
    };
    Ok(plan)
}

/// Commands that switch the system proxy off. Identical on every call.
pub fn clear_plan(os: OsFamily, service: &str) -> Result<Vec<ProxyCommand>, ConfigureError> {
    let plan = match os {
        OsFamily::MacOs => ["-setwebproxystate", "-setsecurewebproxystate", "-setsocksfirewallproxystate"]
            .into_iter()
            .map(|flag| ProxyCommand::new("networksetup", [flag, service, "off"]))
            .collect(),
        OsFamily::Windows => vec![registry_value("ProxyEnable", "REG_DWORD", "0")],
        OsFamily::Linux => vec![gnome_mode("none")],
        OsFamily::Other(name) => return Err(ConfigureError::UnsupportedPlatform(name)),
    };
    Ok(plan)
}

fn registry_value(name: &str, kind: &str, data: &str) -> ProxyCommand {
    ProxyCommand::new(
        "reg",
        ["add", WINDOWS_INTERNET_SETTINGS, "/v", name, "/t", kind, "/d", data, "/f"],
    )
}

fn gnome_mode(mode: &str) -> ProxyCommand {
    ProxyCommand::new("gsettings", ["set", GNOME_PROXY_SCHEMA, "mode", mode])
}

/// Runs commands as child processes, discarding their output.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ProxyCommand) -> Result<(), ConfigureError> {
        let status = tokio::process::Command::new(command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ConfigureError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ConfigureError::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

pub struct SystemProxy<R = ProcessRunner> {
    os: OsFamily,
    service: String,
    runner: R,
}

impl SystemProxy<ProcessRunner> {
    /// Configurator for the running OS. `service` is only used on macOS.
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_runner(OsFamily::current(), service, ProcessRunner)
    }
}

impl<R: CommandRunner> SystemProxy<R> {
    pub fn with_runner(os: OsFamily, service: impl Into<String>, runner: R) -> Self {
        Self {
            os,
            service: service.into(),
            runner,
        }
    }

    pub fn plan(&self, proxy: Option<SocketAddrV4>) -> Result<Vec<ProxyCommand>, ConfigureError> {
        match proxy {
            Some(proxy) => install_plan(self.os, &self.service, proxy),
            None => clear_plan(self.os, &self.service),
        }
    }
}

#[async_trait]
impl<R: CommandRunner> ProxyConfigurator for SystemProxy<R> {
    async fn apply(&self, proxy: Option<SocketAddrV4>) -> Result<(), ConfigureError> {
        for command in self.plan(proxy)? {
            debug!("Running {command}");
            self.runner.run(&command).await?;
        }
        Ok(())
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
