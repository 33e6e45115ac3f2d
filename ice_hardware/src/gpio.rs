//! Raspberry Pi GPIO for the engine output-enable line.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ice_traits::DigitalOut;
use rppal::gpio::{Gpio, OutputPin};

use crate::error::{HwError, Result};

/// Output pins are claimed on first write and held for the process lifetime.
pub struct GpioOutputEnable {
    gpio: Gpio,
    pins: HashMap<u8, OutputPin>,
}

impl GpioOutputEnable {
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

impl DigitalOut for GpioOutputEnable {
    fn write(
        &mut self,
        pin: u8,
        high: bool,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let out = match self.pins.entry(pin) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                let p = self
                    .gpio
                    .get(pin)
                    .map_err(|e| HwError::Gpio(e.to_string()))?;
                v.insert(p.into_output())
            }
        };
        if high {
            out.set_high();
        } else {
            out.set_low();
        }
        tracing::debug!(pin, high, "output enable written");
        Ok(())
    }
}
