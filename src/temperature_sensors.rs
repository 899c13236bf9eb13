//! Temperature sensor backends.

pub mod hwmon;

pub use hwmon::{CPU_SENSOR_CHIPS, HwmonSensor};
