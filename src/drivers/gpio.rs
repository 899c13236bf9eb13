use log::info;
use rppal::gpio::{Gpio, OutputPin};

use crate::{
    actuator::{Actuator, ActuatorState},
    error::ActuatorError,
};

/// Fan switched by a GPIO line, BCM numbering.
#[derive(Debug)]
pub struct GpioActuator {
    pin: OutputPin,
}

impl GpioActuator {
    /// Claims `bcm` as a digital output without touching its current level.
    ///
    /// Fails when the GPIO peripheral is missing (not a Raspberry Pi) or not
    /// accessible (no permission on `/dev/gpiomem`).
    pub fn initialize(bcm: u8) -> Result<Self, ActuatorError> {
        let mut pin = Gpio::new()
            .and_then(|gpio| gpio.get(bcm))
            .map_err(|e| ActuatorError::Init {
                pin: bcm,
                source: Box::new(e),
            })?
            .into_output();

        // The fail-safe level must outlive the process.
        pin.set_reset_on_drop(false);

        info!("GPIO {bcm} configured as fan output");
        Ok(Self { pin })
    }
}

impl Actuator for GpioActuator {
    fn state(&self) -> Result<ActuatorState, ActuatorError> {
        Ok(ActuatorState::from(self.pin.is_set_high()))
    }

    fn set_state(&mut self, desired: ActuatorState) -> Result<(), ActuatorError> {
        match desired {
            ActuatorState::On => self.pin.set_high(),
            ActuatorState::Off => self.pin.set_low(),
        }
        Ok(())
    }
}
