//! Logger setup.
//!
//! The daemon logs to syslog when detached and to stderr otherwise. The level
//! always comes from the configuration file.

use anyhow::{Result, anyhow};
use fern::Dispatch;
use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};

use crate::config::LogLevel;

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Syslog,
    Stderr,
}

/// Installs the global logger. Can only succeed once per process.
pub fn init(level: LogLevel, sink: LogSink) -> Result<()> {
    let filter = level.to_level_filter();
    match sink {
        LogSink::Syslog => init_syslog(filter),
        LogSink::Stderr => init_stderr(filter),
    }
}

fn init_syslog(filter: LevelFilter) -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: env!("CARGO_PKG_NAME").into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(filter))
            .map_err(|e| anyhow!("{e}"))
    })
}

fn init_stderr(filter: LevelFilter) -> Result<()> {
    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(filter)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| anyhow!("{e}"))
}
