//! Application entry point and builder pattern implementation.

use anyhow::{Context, Result};
use log::info;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio_util::sync::CancellationToken;

use crate::{
    actuator::{Actuator, ActuatorState},
    config::Config,
    controller::FanController,
    drivers::{gpio::GpioActuator, simulated::SimulatedActuator},
    sensors::TemperatureSensor,
    temperature_sensors::HwmonSensor,
};

/// Wired-up daemon: one control loop plus the signals that stop it.
///
/// # Example
///
/// ```no_run
/// use fanctrl::{application::Application, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// Application::builder()
///     .with_config(Config::default())
///     .build()?
///     .run()
///     .await
/// # }
/// ```
pub struct Application {
    controller: FanController,
    signals: ShutdownSignals,
}

impl Application {
    /// Creates a new ApplicationBuilder for constructing Application instances.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Runs until SIGINT or SIGTERM, then leaves the fan running.
    pub async fn run(self) -> Result<()> {
        let cancel = CancellationToken::new();
        let listener = tokio::spawn(self.signals.cancel_on_signal(cancel.clone()));

        self.controller.run(cancel).await;
        listener.abort();
        info!("Fan control stopped");
        Ok(())
    }

    /// Runs until `cancel` fires. Signals are not handled.
    pub async fn run_until(self, cancel: CancellationToken) {
        self.controller.run(cancel).await;
        info!("Fan control stopped");
    }
}

/// SIGINT and SIGTERM streams, registered before the fan line is claimed.
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    /// Must be called from within a tokio runtime.
    fn register() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?,
            terminate: signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?,
        })
    }

    async fn cancel_on_signal(mut self, cancel: CancellationToken) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("Received SIGINT, shutting down"),
            _ = self.terminate.recv() => info!("Received SIGTERM, shutting down"),
        }
        cancel.cancel();
    }
}

/// Builder pattern for creating Application instances.
///
/// Hardware left unset is taken from the system: the hwmon CPU sensor and
/// the GPIO line named in the configuration.
pub struct ApplicationBuilder {
    config: Option<Config>,
    sensor: Option<Box<dyn TemperatureSensor>>,
    actuator: Option<Box<dyn Actuator>>,
    simulate: bool,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: None,
            sensor: None,
            actuator: None,
            simulate: false,
        }
    }

    /// Sets the configuration for the application.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the system temperature sensor.
    pub fn with_sensor(mut self, sensor: Box<dyn TemperatureSensor>) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Replaces the GPIO fan line.
    pub fn with_actuator(mut self, actuator: Box<dyn Actuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    /// Uses an in-memory fan line when no actuator was given.
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Builds the Application, claiming the GPIO line if needed.
    ///
    /// Shutdown signals are captured first, so a SIGINT or SIGTERM arriving
    /// once the line is claimed still ends in the fail-safe. Must be called
    /// from within a tokio runtime.
    ///
    /// Fails on an invalid configuration or when the fan line cannot be set
    /// up; there is no safe way to run without it.
    pub fn build(self) -> Result<Application> {
        let config = self
            .config
            .ok_or_else(|| anyhow::anyhow!("Configuration is required"))?;
        config.validate().context("Invalid configuration")?;
        let signals = ShutdownSignals::register()?;

        let sensor: Box<dyn TemperatureSensor> = match self.sensor {
            Some(sensor) => sensor,
            None => Box::new(HwmonSensor::new()),
        };

        let actuator: Box<dyn Actuator> = match self.actuator {
            Some(actuator) => actuator,
            None if self.simulate => {
                info!("Simulating fan on GPIO {}", config.gpio_pin);
                Box::new(SimulatedActuator::new(ActuatorState::Off))
            }
            None => Box::new(
                GpioActuator::initialize(config.gpio_pin)
                    .context("No fan control without the GPIO line")?,
            ),
        };

        Ok(Application {
            controller: FanController::new(config, sensor, actuator),
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::sleep;

    struct FixedSensor(f32);

    #[async_trait]
    impl TemperatureSensor for FixedSensor {
        fn key(&self) -> String {
            "fixed".to_string()
        }

        async fn read_temperature(&self) -> Result<f32, SensorError> {
            Ok(self.0)
        }
    }

    #[test]
    fn build_requires_config() {
        let result = Application::builder().simulate(true).build();
        assert!(result.is_err());
    }

    #[test]
    fn build_rejects_inverted_thresholds() {
        let config = Config {
            temp_high: 40.0,
            temp_low: 45.0,
            ..Config::default()
        };
        let result = Application::builder()
            .with_config(config)
            .simulate(true)
            .build();

        assert!(result.is_err());
    }

    fn simulated_app(temp: f32, fan: &SimulatedActuator) -> Application {
        Application::builder()
            .with_config(Config::default())
            .with_sensor(Box::new(FixedSensor(temp)))
            .with_actuator(Box::new(fan.clone()))
            .build()
            .unwrap()
    }

    async fn stops_on_signal(signum: libc::c_int) {
        let fan = SimulatedActuator::new(ActuatorState::Off);
        let handle = tokio::spawn(simulated_app(20.0, &fan).run());
        sleep(Duration::from_millis(50)).await;
        assert!(fan.writes().is_empty());

        // SAFETY: raise has no preconditions; tokio's handler for `signum`
        // is installed by `build`.
        assert_eq!(unsafe { libc::raise(signum) }, 0);

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run did not stop on signal")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(fan.writes(), vec![ActuatorState::On]);
    }

    // Signals are process-wide, so every case runs in this one test.
    #[tokio::test]
    async fn interrupt_and_terminate_leave_fan_running() {
        stops_on_signal(libc::SIGINT).await;
        stops_on_signal(libc::SIGTERM).await;

        // Delivered between build and run.
        let fan = SimulatedActuator::new(ActuatorState::Off);
        let app = simulated_app(20.0, &fan);
        // SAFETY: as above.
        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
        let result = tokio::time::timeout(Duration::from_secs(5), app.run())
            .await
            .expect("run did not stop on early signal");
        assert!(result.is_ok());
        assert_eq!(fan.writes(), vec![ActuatorState::On]);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_cancelled_then_leaves_fan_running() {
        let fan = SimulatedActuator::new(ActuatorState::Off);
        let app = simulated_app(20.0, &fan);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(app.run_until(cancel.clone()));
        sleep(Duration::from_secs(30)).await;
        assert!(fan.writes().is_empty());

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(fan.writes(), vec![ActuatorState::On]);
    }

    #[tokio::test(start_paused = true)]
    async fn hot_reading_switches_fan_on_once() {
        let fan = SimulatedActuator::new(ActuatorState::Off);
        let app = simulated_app(70.0, &fan);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(app.run_until(cancel.clone()));
        sleep(Duration::from_secs(60)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(fan.writes(), vec![ActuatorState::On]);
    }
}
