//! Simulated vehicle collaborators.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ice_traits::{
    AltitudeSource, AnalogSource, Arming, BatteryMonitor, DigitalOut, RcInput, RpmSensor,
    ServoFunction, ServoOutputs,
};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Default)]
struct VehicleState {
    rc: HashMap<u8, u16>,
    armed: bool,
    rpm: HashMap<u8, f32>,
    analog: HashMap<i8, f32>,
    last_ratiometric: Option<bool>,
    battery: HashMap<u8, f32>,
    altitude: Option<f32>,
    pins: HashMap<u8, bool>,
}

/// Pilot inputs, sensors and GPIO of a simulated vehicle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SimVehicle {
    state: Rc<RefCell<VehicleState>>,
}

impl SimVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rc(&self, chan: u8, pwm: u16) {
        self.state.borrow_mut().rc.insert(chan, pwm);
    }

    pub fn clear_rc(&self, chan: u8) {
        self.state.borrow_mut().rc.remove(&chan);
    }

    pub fn set_armed(&self, armed: bool) {
        self.state.borrow_mut().armed = armed;
    }

    /// `None` makes the sensor instance unhealthy.
    pub fn set_rpm(&self, instance: u8, rpm: Option<f32>) {
        let mut s = self.state.borrow_mut();
        match rpm {
            Some(v) => s.rpm.insert(instance, v),
            None => s.rpm.remove(&instance),
        };
    }

    pub fn set_analog(&self, pin: i8, volts: Option<f32>) {
        let mut s = self.state.borrow_mut();
        match volts {
            Some(v) => s.analog.insert(pin, v),
            None => s.analog.remove(&pin),
        };
    }

    /// Whether the last analog read asked for a ratiometric sample.
    pub fn last_ratiometric(&self) -> Option<bool> {
        self.state.borrow().last_ratiometric
    }

    pub fn set_battery(&self, instance: u8, volts: Option<f32>) {
        let mut s = self.state.borrow_mut();
        match volts {
            Some(v) => s.battery.insert(instance, v),
            None => s.battery.remove(&instance),
        };
    }

    pub fn set_altitude(&self, metres: Option<f32>) {
        self.state.borrow_mut().altitude = metres;
    }

    /// Last level written to `pin`, if any.
    pub fn pin_level(&self, pin: u8) -> Option<bool> {
        self.state.borrow().pins.get(&pin).copied()
    }
}

impl RcInput for SimVehicle {
    fn radio_in(&self, chan: u8) -> Option<u16> {
        self.state.borrow().rc.get(&chan).copied()
    }
}

impl Arming for SimVehicle {
    fn is_armed(&self) -> bool {
        self.state.borrow().armed
    }
}

impl RpmSensor for SimVehicle {
    fn rpm(&self, instance: u8) -> Option<f32> {
        self.state.borrow().rpm.get(&instance).copied()
    }
}

impl AnalogSource for SimVehicle {
    fn voltage(&mut self, pin: i8, ratiometric: bool) -> Option<f32> {
        let mut s = self.state.borrow_mut();
        s.last_ratiometric = Some(ratiometric);
        s.analog.get(&pin).copied()
    }
}

impl BatteryMonitor for SimVehicle {
    fn voltage(&self, instance: u8) -> Option<f32> {
        self.state.borrow().battery.get(&instance).copied()
    }
}

impl AltitudeSource for SimVehicle {
    fn relative_altitude(&self) -> Option<f32> {
        self.state.borrow().altitude
    }
}

impl DigitalOut for SimVehicle {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), BoxError> {
        tracing::debug!(pin, high, "sim gpio write");
        self.state.borrow_mut().pins.insert(pin, high);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SimChannel {
    min: u16,
    trim: u16,
    max: u16,
    pwm: Option<u16>,
}

impl SimChannel {
    const fn new(min: u16, trim: u16, max: u16) -> Self {
        Self {
            min,
            trim,
            max,
            pwm: None,
        }
    }
}

#[derive(Debug, Default)]
struct ServoBank {
    channels: HashMap<ServoFunction, SimChannel>,
    write_fault: bool,
}

/// Simulated servo rail. Clones share state.
///
/// Ignition and starter are assigned by default (1000..2000, trim 1000); the
/// gear output only after `with_gear`.
#[derive(Debug, Clone)]
pub struct SimServos {
    bank: Rc<RefCell<ServoBank>>,
}

impl Default for SimServos {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServos {
    pub fn new() -> Self {
        let mut channels = HashMap::new();
        channels.insert(ServoFunction::Ignition, SimChannel::new(1000, 1000, 2000));
        channels.insert(ServoFunction::Starter, SimChannel::new(1000, 1000, 2000));
        Self {
            bank: Rc::new(RefCell::new(ServoBank {
                channels,
                write_fault: false,
            })),
        }
    }

    /// Assign the gear output (1000..2000, trim 1500).
    pub fn with_gear(self) -> Self {
        self.bank
            .borrow_mut()
            .channels
            .insert(ServoFunction::EngineGear, SimChannel::new(1000, 1500, 2000));
        self
    }

    pub fn unassign(&self, function: ServoFunction) {
        self.bank.borrow_mut().channels.remove(&function);
    }

    /// Make every subsequent write fail until cleared.
    pub fn inject_write_fault(&self, fault: bool) {
        self.bank.borrow_mut().write_fault = fault;
    }

    pub fn pwm(&self, function: ServoFunction) -> Option<u16> {
        self.bank
            .borrow()
            .channels
            .get(&function)
            .and_then(|c| c.pwm)
    }

    /// Current output as a 0..=100 scaled value.
    pub fn scaled(&self, function: ServoFunction) -> Option<f32> {
        let bank = self.bank.borrow();
        let c = bank.channels.get(&function)?;
        let pwm = c.pwm?;
        let span = f32::from(c.max.saturating_sub(c.min)).max(1.0);
        Some(f32::from(pwm.saturating_sub(c.min)) * 100.0 / span)
    }

    /// True when the output sits in the upper half of its range.
    pub fn is_on(&self, function: ServoFunction) -> bool {
        self.scaled(function).is_some_and(|v| v >= 50.0)
    }

    fn write(
        &self,
        function: ServoFunction,
        pwm: impl FnOnce(&SimChannel) -> u16,
    ) -> Result<(), BoxError> {
        let mut bank = self.bank.borrow_mut();
        if bank.write_fault {
            return Err(Box::new(HwError::OutputFault(function_name(function))));
        }
        if let Some(c) = bank.channels.get_mut(&function) {
            let v = pwm(c).clamp(c.min, c.max);
            c.pwm = Some(v);
        }
        Ok(())
    }
}

const fn function_name(function: ServoFunction) -> &'static str {
    match function {
        ServoFunction::Ignition => "ignition",
        ServoFunction::Starter => "starter",
        ServoFunction::EngineGear => "engine gear",
    }
}

impl ServoOutputs for SimServos {
    fn function_assigned(&self, function: ServoFunction) -> bool {
        self.bank.borrow().channels.contains_key(&function)
    }

    fn trim(&self, function: ServoFunction) -> Option<u16> {
        self.bank.borrow().channels.get(&function).map(|c| c.trim)
    }

    fn output_pwm(&self, function: ServoFunction) -> Option<u16> {
        self.pwm(function)
    }

    fn set_output_scaled(&mut self, function: ServoFunction, value: f32) -> Result<(), BoxError> {
        let value = value.clamp(0.0, 100.0);
        self.write(function, |c| {
            let span = f32::from(c.max - c.min);
            c.min + (span * value / 100.0).round() as u16
        })
    }

    fn set_output_pwm(&mut self, function: ServoFunction, pwm: u16) -> Result<(), BoxError> {
        self.write(function, |_| pwm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_inputs() {
        let driver = SimVehicle::new();
        let engine_side = driver.clone();
        driver.set_rc(3, 1800);
        driver.set_armed(true);
        assert_eq!(engine_side.radio_in(3), Some(1800));
        assert!(engine_side.is_armed());
        driver.clear_rc(3);
        assert_eq!(engine_side.radio_in(3), None);
    }

    #[test]
    fn scaled_outputs_map_into_range() {
        let mut s = SimServos::new();
        s.set_output_scaled(ServoFunction::Ignition, 100.0).unwrap();
        s.set_output_scaled(ServoFunction::Starter, 0.0).unwrap();
        assert_eq!(s.pwm(ServoFunction::Ignition), Some(2000));
        assert!(s.is_on(ServoFunction::Ignition));
        assert!(!s.is_on(ServoFunction::Starter));
    }

    #[test]
    fn unassigned_writes_are_ignored() {
        let mut s = SimServos::new();
        assert!(!s.function_assigned(ServoFunction::EngineGear));
        s.set_output_pwm(ServoFunction::EngineGear, 1700).unwrap();
        assert_eq!(s.output_pwm(ServoFunction::EngineGear), None);
    }

    #[test]
    fn injected_fault_fails_writes() {
        let mut s = SimServos::new();
        s.inject_write_fault(true);
        let err = s.set_output_scaled(ServoFunction::Starter, 100.0).unwrap_err();
        assert_eq!(err.to_string(), "output fault on starter");
    }
}
