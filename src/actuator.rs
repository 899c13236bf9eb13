//! Binary fan actuator abstraction.

use std::fmt;

use crate::error::ActuatorError;

/// Logical level of the fan output line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActuatorState {
    /// Line driven high, fan running.
    On,
    /// Line driven low, fan stopped.
    #[default]
    Off,
}

impl From<bool> for ActuatorState {
    fn from(high: bool) -> Self {
        if high { Self::On } else { Self::Off }
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Trait for single-line digital outputs driving a fan.
///
/// The state is owned by the implementation. Callers observe it through
/// [`Actuator::state`] before every decision instead of caching it, so
/// changes made behind the daemon's back are picked up on the next poll.
///
/// # Example
///
/// ```
/// use fanctrl::actuator::{Actuator, ActuatorState, switch};
/// use fanctrl::drivers::simulated::SimulatedActuator;
///
/// let mut fan = SimulatedActuator::new(ActuatorState::Off);
/// assert!(switch(&mut fan, ActuatorState::On)?);
/// assert!(!switch(&mut fan, ActuatorState::On)?);
/// assert_eq!(fan.writes(), vec![ActuatorState::On]);
/// # Ok::<(), fanctrl::error::ActuatorError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Actuator: Send {
    /// Reads back the current output level. No side effects.
    fn state(&self) -> Result<ActuatorState, ActuatorError>;

    /// Drives the line to `desired`.
    fn set_state(&mut self, desired: ActuatorState) -> Result<(), ActuatorError>;
}

/// Requests `desired` and writes only if the observed state differs.
///
/// Returns `true` if the hardware state was changed.
pub fn switch(actuator: &mut dyn Actuator, desired: ActuatorState) -> Result<bool, ActuatorError> {
    if actuator.state()? == desired {
        return Ok(false);
    }
    actuator.set_state(desired)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn switch_writes_when_state_differs() {
        let mut mock = MockActuator::new();
        mock.expect_state().times(1).returning(|| Ok(ActuatorState::Off));
        mock.expect_set_state()
            .with(eq(ActuatorState::On))
            .times(1)
            .returning(|_| Ok(()));

        assert!(switch(&mut mock, ActuatorState::On).unwrap());
    }

    #[test]
    fn switch_skips_redundant_write() {
        let mut mock = MockActuator::new();
        mock.expect_state().times(1).returning(|| Ok(ActuatorState::On));
        mock.expect_set_state().times(0);

        assert!(!switch(&mut mock, ActuatorState::On).unwrap());
    }

    #[test]
    fn switch_propagates_read_failure_without_writing() {
        let mut mock = MockActuator::new();
        mock.expect_state().returning(|| {
            Err(ActuatorError::Read {
                pin: 18,
                source: "bus error".into(),
            })
        });
        mock.expect_set_state().times(0);

        let err = switch(&mut mock, ActuatorState::Off).unwrap_err();
        assert!(matches!(err, ActuatorError::Read { pin: 18, .. }));
    }

    #[test]
    fn state_from_level() {
        assert_eq!(ActuatorState::from(true), ActuatorState::On);
        assert_eq!(ActuatorState::from(false), ActuatorState::Off);
        assert_eq!(ActuatorState::default(), ActuatorState::Off);
        assert_eq!(ActuatorState::On.to_string(), "on");
    }
}
