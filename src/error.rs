//! Error types for the fan control daemon.
//!
//! Startup failures ([`ConfigError`], [`ActuatorError::Init`]) are fatal.
//! Runtime failures ([`SensorError`], [`ActuatorError::Read`],
//! [`ActuatorError::Write`]) are logged by the control loop and retried on
//! the next tick.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::actuator::ActuatorState;

/// Boxed backend error carried as a source.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed or unwritable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Temperature sensor failures.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("no CPU temperature sensor found (probed: {})", .probed.join(", "))]
    Unavailable { probed: Vec<String> },
}

/// Output line failures.
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("failed to set up GPIO {pin} as output: {source}")]
    Init {
        pin: u8,
        #[source]
        source: BackendError,
    },

    #[error("failed to read GPIO {pin}: {source}")]
    Read {
        pin: u8,
        #[source]
        source: BackendError,
    },

    #[error("failed to switch GPIO {pin} {state}: {source}")]
    Write {
        pin: u8,
        state: ActuatorState,
        #[source]
        source: BackendError,
    },
}
