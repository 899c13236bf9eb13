use std::fs::File;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{error, info};

use fanctrl::{
    application::Application,
    cli::Cli,
    config,
    logging::{self, LogSink},
};

const DAEMON_OUTPUT: &str = "/var/tmp/fanctrl.log";

fn into_daemon() -> Result<()> {
    File::create(DAEMON_OUTPUT)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{DAEMON_OUTPUT}: {e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    let config = loaded.config;

    let sink = if cli.daemonize {
        into_daemon().context("Failed to daemonize")?;
        LogSink::Syslog
    } else {
        LogSink::Stderr
    };
    logging::init(config.log_level, sink).context("Failed to initialize logging")?;

    info!("fanctrl {}", env!("CARGO_PKG_VERSION"));
    if loaded.created {
        info!("No config at {}, wrote defaults", cli.config.display());
    } else {
        info!("Loaded config from: {}", cli.config.display());
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?
        .block_on(async {
            Application::builder()
                .with_config(config)
                .simulate(cli.simulate)
                .build()
                .inspect_err(|e| error!("{e:#}"))?
                .run()
                .await
        })
}
