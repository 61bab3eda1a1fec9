//! Open-drain GPIO as an `embedded-hal` pin.
//!
//! Driving high releases the line to the pull-up; reads return the actual
//! wire level, so one pin serves as both sides of a single-wire bus.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::hw_init::{gpio_read, gpio_write};

/// A pin configured `INPUT_OUTPUT_OD` by [`init_peripherals`](super::hw_init::init_peripherals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenDrainPin {
    gpio: i32,
}

impl OpenDrainPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub const fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl ErrorType for OpenDrainPin {
    type Error = Infallible;
}

impl OutputPin for OpenDrainPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, true);
        Ok(())
    }
}

impl InputPin for OpenDrainPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.gpio))
    }
}
