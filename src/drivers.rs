//! Fan output drivers.
//!
//! - [`gpio::GpioActuator`] drives a Raspberry Pi GPIO line.
//! - [`simulated::SimulatedActuator`] keeps the line in memory, for dry runs
//!   and tests.

pub mod gpio;
pub mod simulated;
