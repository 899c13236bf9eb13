//! # fanctrl
//!
//! A Linux daemon that keeps a single-board computer's CPU cool by switching
//! a fan on and off through a GPIO line.
//!
//! ## Features
//!
//! - **Hysteresis control**: separate on/off thresholds keep the fan from
//!   chattering around a single set point
//! - **No redundant writes**: the fan line is re-read every poll and only
//!   written when it has to change
//! - **Fail-safe exit**: the fan is left running whenever the loop stops
//! - **Sensor probing**: Raspberry Pi, Intel and AMD CPU sensors via sysfs
//! - **Self-creating config**: an INI file with defaults is written on first run
//!
//! ## Architecture
//!
//! - [`FanController`](controller::FanController) - the control loop
//! - [`TemperatureSensor`](sensors::TemperatureSensor) - temperature source
//! - [`Actuator`](actuator::Actuator) - fan output line
//! - [`Application`](application::Application) - wiring and signal handling
//!
//! ## Example
//!
//! ```no_run
//! use fanctrl::{application::Application, config};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let loaded = config::load(Path::new(config::DEFAULT_CONFIG_PATH))?;
//!     Application::builder()
//!         .with_config(loaded.config)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod actuator;
pub mod application;
pub mod cli;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod load;
pub mod logging;
pub mod sensors;
pub mod temperature_sensors;
