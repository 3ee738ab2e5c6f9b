use glass_traits::{BoxError, Level, OutputLines};
use rppal::gpio::{Gpio, OutputPin};
use tracing::debug;

use crate::error::{HwError, Result};

/// Drive lines on the Raspberry Pi header (BCM numbering).
///
/// Pins are claimed as outputs at construction and start low. rppal resets
/// each pin to its original mode when the handle is dropped.
pub struct GpioLines {
    pins: Vec<(u8, OutputPin)>,
}

impl GpioLines {
    pub fn open(pins: &[u8]) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let mut out = Vec::with_capacity(pins.len());
        for &pin in pins {
            let line = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("open drive pin {pin}: {e}")))?
                .into_output_low();
            out.push((pin, line));
        }
        debug!(?pins, "drive lines claimed");
        Ok(Self { pins: out })
    }
}

impl OutputLines for GpioLines {
    fn set_line(&mut self, pin: u8, level: Level) -> std::result::Result<(), BoxError> {
        let Some((_, line)) = self.pins.iter_mut().find(|(p, _)| *p == pin) else {
            return Err(Box::new(HwError::UnknownPin(pin)));
        };
        match level {
            Level::High => line.set_high(),
            Level::Low => line.set_low(),
        }
        Ok(())
    }
}
