//! Hysteresis fan control loop.
//!
//! Each tick reads the CPU temperature, re-reads the fan state and switches
//! the fan only when the temperature leaves the dead band between
//! `temp_low` and `temp_high` in the direction that requires it:
//!
//! | observed | temperature          | command |
//! |----------|----------------------|---------|
//! | off      | `T >= temp_high`     | on      |
//! | on       | `T < temp_low`       | off     |
//! | any      | otherwise            | none    |
//!
//! Whatever ends the loop (stop request, panic, the future being dropped),
//! the fan is left running.

use std::ops::{Deref, DerefMut};

use log::{Level, debug, error, info, log_enabled, warn};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::{
    actuator::{self, Actuator, ActuatorState},
    config::Config,
    error::SensorError,
    load,
    sensors::TemperatureSensor,
};

/// Consecutive failed reads after which a lost sensor is reported as an error.
pub const SENSOR_FAILURE_ESCALATION: u32 = 12;

/// Switching thresholds in °C. `high` is inclusive, `low` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    pub high: f32,
    pub low: f32,
}

impl Hysteresis {
    pub fn from_config(config: &Config) -> Self {
        Self {
            high: config.temp_high,
            low: config.temp_low,
        }
    }

    /// Returns the state to request, or `None` when no write is needed.
    ///
    /// # Example
    ///
    /// ```
    /// use fanctrl::actuator::ActuatorState::{Off, On};
    /// use fanctrl::controller::Hysteresis;
    ///
    /// let band = Hysteresis { high: 50.0, low: 45.0 };
    /// assert_eq!(band.decide(50.0, Off), Some(On));
    /// assert_eq!(band.decide(47.0, On), None);
    /// assert_eq!(band.decide(44.9, On), Some(Off));
    /// ```
    pub fn decide(&self, temp: f32, observed: ActuatorState) -> Option<ActuatorState> {
        match observed {
            ActuatorState::Off if temp >= self.high => Some(ActuatorState::On),
            ActuatorState::On if temp < self.low => Some(ActuatorState::Off),
            _ => None,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No reading this tick; the fan was left alone.
    SensorUnavailable,
    /// Reading taken, no write needed.
    Held { temp: f32, state: ActuatorState },
    /// The fan was switched to `state`.
    Switched { temp: f32, state: ActuatorState },
    /// Reading or writing the fan line failed; retried next tick.
    ActuatorFault,
}

/// Owns the sensor and the fan line for the lifetime of the loop.
pub struct FanController {
    config: Config,
    hysteresis: Hysteresis,
    sensor: Box<dyn TemperatureSensor>,
    actuator: Box<dyn Actuator>,
    sensor_failures: u32,
}

impl FanController {
    /// Creates a controller. `config` is expected to be validated.
    pub fn new(
        config: Config,
        sensor: Box<dyn TemperatureSensor>,
        actuator: Box<dyn Actuator>,
    ) -> Self {
        Self {
            hysteresis: Hysteresis::from_config(&config),
            config,
            sensor,
            actuator,
            sensor_failures: 0,
        }
    }

    /// Runs one poll: read, decide, switch if needed.
    pub async fn tick(&mut self) -> TickOutcome {
        let temp = match self.sensor.read_temperature().await {
            Ok(temp) => {
                self.sensor_recovered();
                temp
            }
            Err(e) => {
                self.sensor_failed(&e);
                return TickOutcome::SensorUnavailable;
            }
        };

        if log_enabled!(Level::Debug) {
            log_reading(temp);
        }

        let observed = match self.actuator.state() {
            Ok(state) => state,
            Err(e) => {
                error!("Cannot read fan state, skipping tick: {e}");
                return TickOutcome::ActuatorFault;
            }
        };

        let Some(desired) = self.hysteresis.decide(temp, observed) else {
            return TickOutcome::Held {
                temp,
                state: observed,
            };
        };

        match self.actuator.set_state(desired) {
            Ok(()) => {
                info!("Fan switched {desired} at {temp:.1}°C");
                TickOutcome::Switched {
                    temp,
                    state: desired,
                }
            }
            Err(e) => {
                error!("Failed to switch fan {desired} at {temp:.1}°C: {e}");
                TickOutcome::ActuatorFault
            }
        }
    }

    /// Polls every `poll_interval` seconds until `cancel` fires.
    ///
    /// The first poll happens immediately. Cancellation is observed while
    /// waiting for the next poll. On return, and on any unwinding out of this
    /// future, the fan is switched on.
    pub async fn run(self, cancel: CancellationToken) {
        let mut control = FailSafe(self);
        info!(
            "Starting fan monitoring (high={:.1}°C low={:.1}°C, every {}s, sensor {})",
            control.config.temp_high,
            control.config.temp_low,
            control.config.poll_interval,
            control.sensor.key()
        );

        let mut ticker = interval(control.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Terminated by stop request");
                    break;
                }
                _ = ticker.tick() => {
                    control.tick().await;
                }
            }
        }
    }

    fn sensor_failed(&mut self, err: &SensorError) {
        self.sensor_failures = self.sensor_failures.saturating_add(1);
        match self.sensor_failures {
            1 => warn!("{err}; leaving fan unchanged"),
            n if n == SENSOR_FAILURE_ESCALATION => {
                error!("Temperature unavailable for {n} consecutive polls, fan left unchanged: {err}")
            }
            n => debug!("Temperature still unavailable ({n} polls): {err}"),
        }
    }

    fn sensor_recovered(&mut self) {
        if self.sensor_failures > 0 {
            info!(
                "Temperature readings resumed after {} failed polls",
                self.sensor_failures
            );
            self.sensor_failures = 0;
        }
    }
}

fn log_reading(temp: f32) {
    match load::read_load() {
        Ok(loads) => {
            let (one, five, fifteen) = load::format_load(loads);
            debug!("Temperature: {temp:.1}°C Load: {one}/{five}/{fifteen}");
        }
        Err(e) => debug!("Temperature: {temp:.1}°C (load unavailable: {e})"),
    }
}

/// Switches the fan on when dropped.
struct FailSafe(FanController);

impl Deref for FailSafe {
    type Target = FanController;

    fn deref(&self) -> &FanController {
        &self.0
    }
}

impl DerefMut for FailSafe {
    fn deref_mut(&mut self) -> &mut FanController {
        &mut self.0
    }
}

impl Drop for FailSafe {
    fn drop(&mut self) {
        engage_fail_safe(self.0.actuator.as_mut());
    }
}

/// Leaves the fan running, writing only if it is not already on.
pub fn engage_fail_safe(fan: &mut dyn Actuator) {
    match actuator::switch(fan, ActuatorState::On) {
        Ok(_) => info!("Fan left running"),
        Err(e) => error!("Failed to leave fan running: {e}"),
    }
}
