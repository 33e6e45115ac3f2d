//! `From` implementations bridging `ice_config` types to `ice_core` types.

use ice_config::{OPTION_ARMING_REQUIRED_IGNITION, OPTION_ARMING_REQUIRED_START};

use crate::config::{
    EngineOptions, FuelCfg, RpmCfg, StartCfg, TelemetryCfg, TemperatureCfg, ThrottleCfg,
};
use crate::filter::TemperatureFunction;
use crate::util::secs_to_ms;

// ── EngineOptions ────────────────────────────────────────────────────────────

impl EngineOptions {
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            arming_required_for_ignition: bits & OPTION_ARMING_REQUIRED_IGNITION != 0,
            arming_required_for_start: bits & OPTION_ARMING_REQUIRED_START != 0,
        }
    }

    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.arming_required_for_ignition {
            bits |= OPTION_ARMING_REQUIRED_IGNITION;
        }
        if self.arming_required_for_start {
            bits |= OPTION_ARMING_REQUIRED_START;
        }
        bits
    }
}

// ── Engine section ───────────────────────────────────────────────────────────

impl From<&ice_config::EngineSection> for StartCfg {
    fn from(c: &ice_config::EngineSection) -> Self {
        Self {
            start_chan: c.start_chan,
            starter_time_ms: secs_to_ms(c.starter_time_s),
            start_delay_ms: secs_to_ms(c.start_delay_s),
            power_up_wait_ms: u64::from(c.power_up_wait_s) * crate::util::MILLIS_PER_SEC,
            restarts_allowed: i32::from(c.restart_count),
            options: EngineOptions::from_bits(c.options),
        }
    }
}

impl From<&ice_config::EngineSection> for RpmCfg {
    fn from(c: &ice_config::EngineSection) -> Self {
        Self {
            instance: c.rpm_instance,
            threshold_running: u32::try_from(c.rpm_threshold).unwrap_or(0),
            threshold_starting: u32::try_from(c.rpm_threshold_starting).unwrap_or(0),
        }
    }
}

impl From<&ice_config::EngineSection> for ThrottleCfg {
    fn from(c: &ice_config::EngineSection) -> Self {
        Self {
            start_pct: c.start_pct,
            idle_pct: c.idle_pct,
        }
    }
}

// ── Sensors ──────────────────────────────────────────────────────────────────

impl From<ice_config::TemperatureFunction> for TemperatureFunction {
    fn from(f: ice_config::TemperatureFunction) -> Self {
        match f {
            ice_config::TemperatureFunction::Linear => Self::Linear,
            ice_config::TemperatureFunction::Inverted => Self::Inverted,
            ice_config::TemperatureFunction::Hyperbola => Self::Hyperbola,
        }
    }
}

impl From<&ice_config::TemperatureSection> for TemperatureCfg {
    fn from(c: &ice_config::TemperatureSection) -> Self {
        Self {
            pin: c.pin,
            scaler: c.scaler,
            offset: c.offset,
            ratiometric: c.ratiometric,
            function: c.function.into(),
            max: c.max,
            min: c.min,
            too_hot_throttle_factor: c.too_hot_throttle_factor,
        }
    }
}

impl From<&ice_config::FuelSection> for FuelCfg {
    fn from(c: &ice_config::FuelSection) -> Self {
        Self {
            offset: c.offset,
            battery_instance: c.battery_instance,
        }
    }
}

impl From<&ice_config::TelemetrySection> for TelemetryCfg {
    fn from(c: &ice_config::TelemetrySection) -> Self {
        Self {
            interval_ms: c.interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_bits_round_trip() {
        for bits in 0..4 {
            assert_eq!(EngineOptions::from_bits(bits).bits(), bits);
        }
        assert!(EngineOptions::from_bits(2).arming_required_for_start);
        assert!(!EngineOptions::from_bits(2).arming_required_for_ignition);
    }

    #[test]
    fn engine_section_maps_to_millis() {
        let s = ice_config::EngineSection {
            start_chan: 7,
            starter_time_s: 1.5,
            power_up_wait_s: 4,
            rpm_threshold: -5,
            ..Default::default()
        };
        let start = StartCfg::from(&s);
        assert_eq!(start.start_chan, 7);
        assert_eq!(start.starter_time_ms, 1_500);
        assert_eq!(start.start_delay_ms, 2_000);
        assert_eq!(start.power_up_wait_ms, 4_000);
        assert_eq!(start.restarts_allowed, -1);
        assert_eq!(RpmCfg::from(&s).threshold_running, 0);
    }
}
