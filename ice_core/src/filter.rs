//! Staleness-aware low-pass filtered sensor readings.

use ice_traits::{AnalogSource, BatteryMonitor};

use crate::config::{FuelCfg, TemperatureCfg};

/// A reading older than this is unhealthy and the next sample replaces it outright.
pub const STALE_MS: u64 = 5_000;

const KEEP: f32 = 0.1;
const TAKE: f32 = 0.9;

/// Raw voltage to temperature mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemperatureFunction {
    /// `(v - offset) * scaler`
    #[default]
    Linear,
    /// `(offset - v) * scaler`
    Inverted,
    /// `scaler / (v - offset)`
    Hyperbola,
}

/// Single-pole filtered value with its last sample time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilteredReading {
    value: f32,
    last_sample_ms: Option<u64>,
}

impl FilteredReading {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn last_sample_ms(&self) -> Option<u64> {
        self.last_sample_ms
    }

    /// True when a sample arrived within the staleness window.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        matches!(self.last_sample_ms, Some(t) if now_ms.saturating_sub(t) < STALE_MS)
    }

    /// Blend in a new sample. The first sample, or one after the reading went
    /// stale, replaces the value outright.
    pub fn sample(&mut self, raw: f32, now_ms: u64) {
        self.value = if self.is_fresh(now_ms) {
            KEEP * self.value + TAKE * raw
        } else {
            raw
        };
        self.last_sample_ms = Some(now_ms);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct TemperatureSensor {
    cfg: TemperatureCfg,
    reading: FilteredReading,
}

impl TemperatureSensor {
    pub fn new(cfg: TemperatureCfg) -> Self {
        Self {
            cfg,
            reading: FilteredReading::default(),
        }
    }

    pub fn cfg(&self) -> &TemperatureCfg {
        &self.cfg
    }

    pub fn reading(&self) -> &FilteredReading {
        &self.reading
    }

    pub fn enabled(&self) -> bool {
        self.cfg.pin > 0
    }

    /// Map a raw voltage to a temperature. `None` for samples that would
    /// divide by zero or produce a non-finite value.
    pub fn convert(&self, v: f32) -> Option<f32> {
        let c = &self.cfg;
        let t = match c.function {
            TemperatureFunction::Linear => (v - c.offset) * c.scaler,
            TemperatureFunction::Inverted => (c.offset - v) * c.scaler,
            TemperatureFunction::Hyperbola => {
                let d = v - c.offset;
                if d.abs() < f32::EPSILON {
                    return None;
                }
                c.scaler / d
            }
        };
        t.is_finite().then_some(t)
    }

    /// Feed one voltage sample. Returns true if it was accepted.
    pub fn sample_voltage(&mut self, v: f32, now_ms: u64) -> bool {
        match self.convert(v) {
            Some(t) => {
                self.reading.sample(t, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, source: &mut dyn AnalogSource, now_ms: u64) {
        if !self.enabled() {
            self.reading.clear();
            return;
        }
        if let Some(v) = source.voltage(self.cfg.pin, self.cfg.ratiometric) {
            self.sample_voltage(v, now_ms);
        }
    }

    pub fn is_healthy(&self, now_ms: u64) -> bool {
        self.enabled() && self.reading.is_fresh(now_ms)
    }

    /// Filtered temperature, only while healthy.
    pub fn temperature(&self, now_ms: u64) -> Option<f32> {
        self.is_healthy(now_ms).then_some(self.reading.value)
    }

    fn limits_enabled(&self) -> bool {
        self.cfg.min < self.cfg.max
    }

    pub fn too_hot(&self, now_ms: u64) -> bool {
        self.limits_enabled()
            && self
                .temperature(now_ms)
                .is_some_and(|t| t > f32::from(self.cfg.max))
    }

    pub fn too_cold(&self, now_ms: u64) -> bool {
        self.limits_enabled()
            && self
                .temperature(now_ms)
                .is_some_and(|t| t < f32::from(self.cfg.min))
    }
}

#[derive(Debug, Clone)]
pub struct FuelSensor {
    cfg: FuelCfg,
    reading: FilteredReading,
    source_healthy: bool,
}

impl FuelSensor {
    pub fn new(cfg: FuelCfg) -> Self {
        Self {
            cfg,
            reading: FilteredReading::default(),
            source_healthy: false,
        }
    }

    pub fn reading(&self) -> &FilteredReading {
        &self.reading
    }

    /// Feed one battery-monitor voltage; `None` marks the source unhealthy.
    pub fn sample_voltage(&mut self, voltage: Option<f32>, now_ms: u64) {
        match voltage {
            Some(v) if v.is_finite() => {
                self.source_healthy = true;
                self.reading.sample(self.cfg.offset + v, now_ms);
            }
            _ => self.source_healthy = false,
        }
    }

    pub fn update(&mut self, battery: &dyn BatteryMonitor, now_ms: u64) {
        self.sample_voltage(battery.voltage(self.cfg.battery_instance), now_ms);
    }

    pub fn is_healthy(&self, now_ms: u64) -> bool {
        self.source_healthy && self.reading.is_fresh(now_ms)
    }

    pub fn level(&self, now_ms: u64) -> Option<f32> {
        self.is_healthy(now_ms).then_some(self.reading.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(function: TemperatureFunction, scaler: f32, offset: f32) -> TemperatureSensor {
        TemperatureSensor::new(TemperatureCfg {
            pin: 3,
            scaler,
            offset,
            function,
            ..TemperatureCfg::default()
        })
    }

    #[test]
    fn first_sample_replaces_then_blends() {
        let mut r = FilteredReading::default();
        r.sample(50.0, 0);
        assert_eq!(r.value(), 50.0);
        r.sample(100.0, 100);
        assert!((r.value() - 95.0).abs() < 1e-4);
    }

    #[test]
    fn stale_sample_jumps() {
        let mut r = FilteredReading::default();
        r.sample(10.0, 0);
        assert!(r.is_fresh(4_999));
        assert!(!r.is_fresh(5_000));
        r.sample(80.0, 5_000);
        assert_eq!(r.value(), 80.0);
    }

    #[test]
    fn temperature_functions() {
        assert_eq!(temp(TemperatureFunction::Linear, 100.0, 0.5).convert(1.0), Some(50.0));
        assert_eq!(temp(TemperatureFunction::Inverted, 10.0, 5.0).convert(1.0), Some(40.0));
        assert_eq!(temp(TemperatureFunction::Hyperbola, 20.0, 1.0).convert(3.0), Some(10.0));
        assert_eq!(temp(TemperatureFunction::Hyperbola, 20.0, 1.0).convert(1.0), None);
    }

    #[test]
    fn rejected_sample_keeps_previous_value() {
        let mut s = temp(TemperatureFunction::Hyperbola, 20.0, 1.0);
        assert!(s.sample_voltage(3.0, 0));
        assert!(!s.sample_voltage(1.0, 100));
        assert_eq!(s.reading().value(), 10.0);
        assert_eq!(s.reading().last_sample_ms(), Some(0));
    }

    #[test]
    fn equal_limits_disable_hot_and_cold() {
        let mut s = TemperatureSensor::new(TemperatureCfg {
            pin: 1,
            min: 50,
            max: 50,
            ..TemperatureCfg::default()
        });
        s.sample_voltage(200.0, 0);
        assert!(!s.too_hot(0));
        s.sample_voltage(-200.0, 6_000);
        assert!(!s.too_cold(6_000));
    }

    #[test]
    fn fuel_unhealthy_source_overrides_freshness() {
        let mut f = FuelSensor::new(FuelCfg {
            offset: 2.0,
            battery_instance: 1,
        });
        f.sample_voltage(Some(40.0), 0);
        assert_eq!(f.level(0), Some(42.0));
        f.sample_voltage(None, 100);
        assert_eq!(f.level(100), None);
    }
}
