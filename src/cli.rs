use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// On/off CPU fan control for single-board computers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path, created with defaults if missing
    #[arg(
        short = 'c',
        long = "config",
        env = "FANCTRL_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Detach from the terminal and log to syslog
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,

    /// Drive an in-memory fan line instead of GPIO
    #[arg(long = "simulate", default_value = "false")]
    pub simulate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["fanctrl"]).unwrap();

        if std::env::var_os("FANCTRL_CONFIG").is_none() {
            assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        }
        assert!(!cli.daemonize);
        assert!(!cli.simulate);
    }

    #[test]
    fn flags() {
        let cli =
            Cli::try_parse_from(["fanctrl", "-c", "/tmp/fan.conf", "-d", "--simulate"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("/tmp/fan.conf"));
        assert!(cli.daemonize);
        assert!(cli.simulate);
    }
}
