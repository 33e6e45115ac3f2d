//! Configuration types for the engine controller.
//!
//! These are the runtime configuration structs used by `IcEngine`.
//! They are separate from the TOML-deserialized config in `ice_config`.

use crate::filter::TemperatureFunction;

/// Arming requirements. The bitmask form exists only in `ice_config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Ignition is only permitted while armed.
    pub arming_required_for_ignition: bool,
    /// The starter is only permitted while armed.
    pub arming_required_for_start: bool,
}

/// Start sequence configuration.
#[derive(Debug, Clone, Copy)]
pub struct StartCfg {
    /// 1-based RC channel of the start switch; 0 = none configured.
    pub start_chan: u8,
    /// Maximum starter run per attempt.
    pub starter_time_ms: u64,
    /// Delay between start attempts, measured from the last starter run.
    pub start_delay_ms: u64,
    /// Wait after first reaching the start position before cranking; 0 = none.
    pub power_up_wait_ms: u64,
    /// Restart attempts permitted; negative = unlimited.
    pub restarts_allowed: i32,
    pub options: EngineOptions,
}

impl Default for StartCfg {
    fn default() -> Self {
        Self {
            start_chan: 0,
            starter_time_ms: 3_000,
            start_delay_ms: 2_000,
            power_up_wait_ms: 0,
            restarts_allowed: -1,
            options: EngineOptions::default(),
        }
    }
}

/// RPM feedback thresholds. A threshold of 0 disables the check.
#[derive(Debug, Clone, Copy)]
pub struct RpmCfg {
    /// 1-based RPM sensor instance; 0 = no sensor.
    pub instance: u8,
    /// Below this while running the engine is considered dead.
    pub threshold_running: u32,
    /// At or above this while starting the engine is considered running.
    pub threshold_starting: u32,
}

impl Default for RpmCfg {
    fn default() -> Self {
        Self {
            instance: 0,
            threshold_running: 100,
            threshold_starting: 0,
        }
    }
}

/// Throttle percentages used by the override provider.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleCfg {
    /// Throttle held while starting.
    pub start_pct: i8,
    /// Idle floor while running; 0 disables it.
    pub idle_pct: i8,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            start_pct: 5,
            idle_pct: 0,
        }
    }
}

/// Coolant temperature sensor.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureCfg {
    /// Analog pin; <= 0 disables the sensor.
    pub pin: i8,
    pub scaler: f32,
    pub offset: f32,
    pub ratiometric: bool,
    pub function: TemperatureFunction,
    /// Too-hot threshold. The hot/cold checks are disabled unless `min < max`.
    pub max: i16,
    /// Too-cold threshold.
    pub min: i16,
    /// Throttle multiplier applied when too hot, clamped to [0, 1].
    pub too_hot_throttle_factor: f32,
}

impl Default for TemperatureCfg {
    fn default() -> Self {
        Self {
            pin: -1,
            scaler: 1.0,
            offset: 0.0,
            ratiometric: true,
            function: TemperatureFunction::Linear,
            max: 105,
            min: 10,
            too_hot_throttle_factor: 0.25,
        }
    }
}

/// Fuel level from a battery-monitor voltage.
#[derive(Debug, Clone, Copy)]
pub struct FuelCfg {
    pub offset: f32,
    pub battery_instance: u8,
}

impl Default for FuelCfg {
    fn default() -> Self {
        Self {
            offset: 0.0,
            battery_instance: 1,
        }
    }
}

/// Outbound status rate limit.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryCfg {
    pub interval_ms: u64,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self { interval_ms: 1_000 }
    }
}
