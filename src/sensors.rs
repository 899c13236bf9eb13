use async_trait::async_trait;

use crate::error::SensorError;

/// Source of CPU temperature readings in degrees Celsius.
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    /// Identifier used in log lines.
    fn key(&self) -> String;

    /// Reads the current temperature. Implementations do not retry.
    async fn read_temperature(&self) -> Result<f32, SensorError>;
}
