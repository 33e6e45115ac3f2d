pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Pilot RC input as already decoded by the receiver driver.
pub trait RcInput {
    /// Raw pulse width in microseconds on 1-based channel `chan`.
    /// `None` when the channel does not exist.
    fn radio_in(&self, chan: u8) -> Option<u16>;
}

/// Vehicle arming state.
pub trait Arming {
    fn is_armed(&self) -> bool;
}

/// Engine speed feedback. Returns `None` when the instance is missing or unhealthy.
pub trait RpmSensor {
    fn rpm(&self, instance: u8) -> Option<f32>;
}

/// Averaged analog input voltage on `pin`, either absolute or ratiometric to
/// the sensor supply. `None` when no sample is available.
pub trait AnalogSource {
    fn voltage(&mut self, pin: i8, ratiometric: bool) -> Option<f32>;
}

/// Battery monitor voltage. Returns `None` when the instance is unhealthy.
pub trait BatteryMonitor {
    fn voltage(&self, instance: u8) -> Option<f32>;
}

/// Height above the navigation origin in metres, positive up.
pub trait AltitudeSource {
    fn relative_altitude(&self) -> Option<f32>;
}

/// Servo output functions the engine controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServoFunction {
    Ignition,
    Starter,
    EngineGear,
}

/// Actuator outputs addressed by function rather than by channel number.
pub trait ServoOutputs {
    /// True when some output channel carries `function`.
    fn function_assigned(&self, function: ServoFunction) -> bool;

    /// Trim pulse width of the channel carrying `function`.
    fn trim(&self, function: ServoFunction) -> Option<u16>;

    /// Pulse width currently commanded on the channel carrying `function`.
    fn output_pwm(&self, function: ServoFunction) -> Option<u16>;

    /// Command a scaled value (0..=100) on `function`.
    fn set_output_scaled(
        &mut self,
        function: ServoFunction,
        value: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Command a raw pulse width on `function`.
    fn set_output_pwm(
        &mut self,
        function: ServoFunction,
        pwm: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Drive `function` to its trim value. No-op when the function is unassigned.
    fn set_output_to_trim(
        &mut self,
        function: ServoFunction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self.trim(function) {
            Some(trim) => self.set_output_pwm(function, trim),
            None => Ok(()),
        }
    }
}

/// Digital output used for the master output-enable line.
pub trait DigitalOut {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
