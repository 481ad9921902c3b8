pub mod run;

use clap::Parser;
use proxyscout_core::discovery::Mode;

#[derive(Parser)]
#[command(name = "proxyscout")]
#[command(version, about = "Finds a Clash proxy on the local network and makes it the system proxy.")]
#[command(after_help = "Settings are read from the environment: PROXY_PORT, NETWORK_INTERFACE, \
SCAN_TIMEOUT, MAX_WORKERS, PROXY_TEST_URL, PROXY_TEST_TIMEOUT, PORT_CHECK_TIMEOUT, \
NETWORK_SERVICE, DEBUG")]
pub struct CommandLine {
    /// Clear the system proxy settings instead of scanning
    #[arg(short, long)]
    pub clear: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn mode(&self) -> Mode {
        if self.clear { Mode::Clear } else { Mode::Discover }
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        CommandLine::command().debug_assert();
    }

    #[test]
    fn no_flag_means_discover() {
        let cmd = CommandLine::try_parse_from(["proxyscout"]).unwrap();
        assert_eq!(cmd.mode(), Mode::Discover);
    }

    #[test]
    fn clear_flag_means_clear() {
        let long = CommandLine::try_parse_from(["proxyscout", "--clear"]).unwrap();
        let short = CommandLine::try_parse_from(["proxyscout", "-c"]).unwrap();
        assert_eq!(long.mode(), Mode::Clear);
        assert_eq!(short.mode(), Mode::Clear);
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(CommandLine::try_parse_from(["proxyscout", "eth0"]).is_err());
    }
}
