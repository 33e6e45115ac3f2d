//! Stand-in collaborators for sensors a vehicle does not have.

/// Reports nothing on every sensor trait; the engine treats its readings as
/// unknown or unhealthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

impl ice_traits::RpmSensor for NoSensor {
    fn rpm(&self, _instance: u8) -> Option<f32> {
        None
    }
}

impl ice_traits::AnalogSource for NoSensor {
    fn voltage(&mut self, _pin: i8, _ratiometric: bool) -> Option<f32> {
        None
    }
}

impl ice_traits::BatteryMonitor for NoSensor {
    fn voltage(&self, _instance: u8) -> Option<f32> {
        None
    }
}

impl ice_traits::AltitudeSource for NoSensor {
    fn relative_altitude(&self) -> Option<f32> {
        None
    }
}
