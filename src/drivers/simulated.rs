//! In-memory fan output.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::{
    actuator::{Actuator, ActuatorState},
    error::ActuatorError,
};

/// Pin number reported in errors raised by the simulated line.
pub const SIMULATED_PIN: u8 = u8::MAX;

#[derive(Debug, Default)]
struct Line {
    state: ActuatorState,
    writes: Vec<ActuatorState>,
    fail_writes: bool,
}

/// Output line kept in memory.
///
/// Clones share the same line, so a test can hand one clone to the
/// controller and inspect the recorded writes through another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedActuator(Arc<Mutex<Line>>);

impl SimulatedActuator {
    pub fn new(initial: ActuatorState) -> Self {
        Self(Arc::new(Mutex::new(Line {
            state: initial,
            ..Line::default()
        })))
    }

    /// Every state written through [`Actuator::set_state`], in order.
    pub fn writes(&self) -> Vec<ActuatorState> {
        self.line().writes.clone()
    }

    /// Changes the level without recording a write, as another process
    /// toggling the pin would.
    pub fn force_level(&self, state: ActuatorState) {
        self.line().state = state;
    }

    /// Makes subsequent writes fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.line().fail_writes = fail;
    }

    fn line(&self) -> MutexGuard<'_, Line> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Actuator for SimulatedActuator {
    fn state(&self) -> Result<ActuatorState, ActuatorError> {
        Ok(self.line().state)
    }

    fn set_state(&mut self, desired: ActuatorState) -> Result<(), ActuatorError> {
        let mut line = self.line();
        if line.fail_writes {
            return Err(ActuatorError::Write {
                pin: SIMULATED_PIN,
                state: desired,
                source: "simulated write failure".into(),
            });
        }
        debug!("[simulated] fan line -> {desired}");
        line.state = desired;
        line.writes.push(desired);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clones_share_the_line() {
        let observer = SimulatedActuator::new(ActuatorState::Off);
        let mut driver = observer.clone();

        driver.set_state(ActuatorState::On).unwrap();

        assert_eq!(observer.state().unwrap(), ActuatorState::On);
        assert_eq!(observer.writes(), vec![ActuatorState::On]);
    }

    #[test]
    fn forced_level_is_not_a_write() {
        let fan = SimulatedActuator::default();
        fan.force_level(ActuatorState::On);

        assert_eq!(fan.state().unwrap(), ActuatorState::On);
        assert!(fan.writes().is_empty());
    }

    #[test]
    fn failing_writes_keep_the_level() {
        let mut fan = SimulatedActuator::new(ActuatorState::Off);
        fan.fail_writes(true);

        let err = fan.set_state(ActuatorState::On).unwrap_err();

        assert!(matches!(
            err,
            ActuatorError::Write {
                state: ActuatorState::On,
                ..
            }
        ));
        assert_eq!(fan.state().unwrap(), ActuatorState::Off);
        assert!(fan.writes().is_empty());
    }
}
