mod commands;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use commands::{CommandLine, run};
use proxyscout_common::config::Config;
use terminal::{print, spinner};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();
    let cfg = Config::from_env().context("invalid configuration in the environment")?;

    spinner::init_logging(cfg.debug)?;
    print::banner();

    Ok(run::run(commands.mode(), Arc::new(cfg)).await)
}
