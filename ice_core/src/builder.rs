//! Type-state builder for `IcEngine`.
//!
//! The builder enforces at compile time that RC input, servo outputs and the
//! arming source are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use ice_traits::clock::{Clock, MonotonicClock};
use ice_traits::{
    AltitudeSource, AnalogSource, Arming, BatteryMonitor, DigitalOut, RcInput, RpmSensor,
    ServoOutputs,
};

use crate::config::{FuelCfg, RpmCfg, StartCfg, TelemetryCfg, TemperatureCfg, ThrottleCfg};
use crate::controller::Controller;
use crate::engine::IcEngine;
use crate::error::{BuildError, Result};
use crate::filter::{FuelSensor, TemperatureSensor};
use crate::mocks::NoSensor;
use crate::output::OutputMapper;
use crate::overrides::OverrideProvider;
use crate::telemetry::{StatusLink, TelemetryReporter};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

#[derive(Default)]
struct Parts {
    rc: Option<Box<dyn RcInput>>,
    servos: Option<Box<dyn ServoOutputs>>,
    arming: Option<Box<dyn Arming>>,
    rpm: Option<Box<dyn RpmSensor>>,
    analog: Option<Box<dyn AnalogSource>>,
    battery: Option<Box<dyn BatteryMonitor>>,
    altitude: Option<Box<dyn AltitudeSource>>,
    output_enable: Option<Box<dyn DigitalOut>>,
    links: Vec<Box<dyn StatusLink>>,
    start: Option<StartCfg>,
    rpm_cfg: Option<RpmCfg>,
    throttle: Option<ThrottleCfg>,
    temperature: Option<TemperatureCfg>,
    fuel: Option<FuelCfg>,
    telemetry: Option<TelemetryCfg>,
    enabled: Option<bool>,
    output_enable_pin: Option<i8>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

/// Builder for `IcEngine`. All fields are validated on `build()`.
pub struct IcEngineBuilder<R, S, A> {
    parts: Parts,
    _r: PhantomData<R>,
    _s: PhantomData<S>,
    _a: PhantomData<A>,
}

impl Default for IcEngineBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            parts: Parts::default(),
            _r: PhantomData,
            _s: PhantomData,
            _a: PhantomData,
        }
    }
}

impl IcEngine {
    /// Start building an engine controller.
    pub fn builder() -> IcEngineBuilder<Missing, Missing, Missing> {
        IcEngineBuilder::default()
    }
}

/// Validate configuration and construct an `IcEngine`.
///
/// This is the single source of truth for validation and construction.
fn validate_and_build(p: Parts) -> Result<IcEngine> {
    let invalid = |msg: &'static str| eyre::Report::new(BuildError::InvalidConfig(msg));

    let rc = p
        .rc
        .ok_or_else(|| eyre::Report::new(BuildError::MissingRcInput))?;
    let servos = p
        .servos
        .ok_or_else(|| eyre::Report::new(BuildError::MissingServos))?;
    let arming = p
        .arming
        .ok_or_else(|| eyre::Report::new(BuildError::MissingArming))?;

    let start = p.start.unwrap_or_default();
    let rpm_cfg = p.rpm_cfg.unwrap_or_default();
    let throttle = p.throttle.unwrap_or_default();
    let temperature = p.temperature.unwrap_or_default();
    let fuel = p.fuel.unwrap_or_default();
    let telemetry = p.telemetry.unwrap_or_default();

    // ── Validation ───────────────────────────────────────────────────────────
    if start.starter_time_ms == 0 {
        return Err(invalid("starter_time must be > 0"));
    }
    if !(0..=100).contains(&throttle.start_pct) {
        return Err(invalid("start_pct must be in [0, 100]"));
    }
    if !(0..=100).contains(&throttle.idle_pct) {
        return Err(invalid("idle_pct must be in [0, 100]"));
    }
    if !temperature.scaler.is_finite() || !temperature.offset.is_finite() {
        return Err(invalid("temperature scaler and offset must be finite"));
    }
    if !temperature.too_hot_throttle_factor.is_finite() {
        return Err(invalid("too_hot_throttle_factor must be finite"));
    }
    if !fuel.offset.is_finite() {
        return Err(invalid("fuel offset must be finite"));
    }
    if telemetry.interval_ms == 0 {
        return Err(invalid("telemetry interval_ms must be >= 1"));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match p.clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();

    Ok(IcEngine {
        enabled: p.enabled.unwrap_or(true),
        run_once: false,
        output_enable_pin: p.output_enable_pin.unwrap_or(-1),
        rc,
        arming,
        rpm_sensor: p.rpm.unwrap_or_else(|| Box::new(NoSensor)),
        analog: p.analog.unwrap_or_else(|| Box::new(NoSensor)),
        battery: p.battery.unwrap_or_else(|| Box::new(NoSensor)),
        altitude: p.altitude.unwrap_or_else(|| Box::new(NoSensor)),
        servos,
        output_enable: p.output_enable,
        links: p.links,
        clock,
        epoch,
        controller: Controller::new(start, rpm_cfg, throttle.idle_pct),
        temperature: TemperatureSensor::new(temperature),
        fuel: FuelSensor::new(fuel),
        outputs: OutputMapper::default(),
        overrides: OverrideProvider::default(),
        telemetry: TelemetryReporter::new(telemetry.interval_ms),
        throttle,
        rpm_instance: rpm_cfg.instance,
        pending: Vec::new(),
    })
}

impl<R, S, A> IcEngineBuilder<R, S, A> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<IcEngine> {
        validate_and_build(self.parts)
    }

    fn with_parts<R2, S2, A2>(parts: Parts) -> IcEngineBuilder<R2, S2, A2> {
        IcEngineBuilder {
            parts,
            _r: PhantomData,
            _s: PhantomData,
            _a: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<R, S, A> IcEngineBuilder<R, S, A> {
    pub fn with_rpm_sensor(mut self, rpm: impl RpmSensor + 'static) -> Self {
        self.parts.rpm = Some(Box::new(rpm));
        self
    }
    pub fn with_analog(mut self, analog: impl AnalogSource + 'static) -> Self {
        self.parts.analog = Some(Box::new(analog));
        self
    }
    pub fn with_battery(mut self, battery: impl BatteryMonitor + 'static) -> Self {
        self.parts.battery = Some(Box::new(battery));
        self
    }
    pub fn with_altitude(mut self, altitude: impl AltitudeSource + 'static) -> Self {
        self.parts.altitude = Some(Box::new(altitude));
        self
    }
    pub fn with_output_enable(mut self, out: impl DigitalOut + 'static) -> Self {
        self.parts.output_enable = Some(Box::new(out));
        self
    }
    /// Add an outbound status link. May be called more than once.
    pub fn with_link(mut self, link: impl StatusLink + 'static) -> Self {
        self.parts.links.push(Box::new(link));
        self
    }
    pub fn with_start(mut self, start: StartCfg) -> Self {
        self.parts.start = Some(start);
        self
    }
    pub fn with_rpm(mut self, rpm: RpmCfg) -> Self {
        self.parts.rpm_cfg = Some(rpm);
        self
    }
    pub fn with_throttle(mut self, throttle: ThrottleCfg) -> Self {
        self.parts.throttle = Some(throttle);
        self
    }
    pub fn with_temperature(mut self, temperature: TemperatureCfg) -> Self {
        self.parts.temperature = Some(temperature);
        self
    }
    pub fn with_fuel(mut self, fuel: FuelCfg) -> Self {
        self.parts.fuel = Some(fuel);
        self
    }
    pub fn with_telemetry(mut self, telemetry: TelemetryCfg) -> Self {
        self.parts.telemetry = Some(telemetry);
        self
    }
    /// Module enable flag; defaults to enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.parts.enabled = Some(enabled);
        self
    }
    /// Output-enable GPIO; negative disables it.
    pub fn with_output_enable_pin(mut self, pin: i8) -> Self {
        self.parts.output_enable_pin = Some(pin);
        self
    }
    /// Apply every section of a loaded configuration file.
    pub fn with_config(self, cfg: &ice_config::Config) -> Self {
        self.with_start((&cfg.engine).into())
            .with_rpm((&cfg.engine).into())
            .with_throttle((&cfg.engine).into())
            .with_temperature((&cfg.temperature).into())
            .with_fuel((&cfg.fuel).into())
            .with_telemetry((&cfg.telemetry).into())
            .with_enabled(cfg.engine.enable)
            .with_output_enable_pin(cfg.engine.output_enable_pin)
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.parts.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<S, A> IcEngineBuilder<Missing, S, A> {
    pub fn with_rc(mut self, rc: impl RcInput + 'static) -> IcEngineBuilder<Set, S, A> {
        self.parts.rc = Some(Box::new(rc));
        Self::with_parts(self.parts)
    }
}

impl<R, A> IcEngineBuilder<R, Missing, A> {
    pub fn with_servos(
        mut self,
        servos: impl ServoOutputs + 'static,
    ) -> IcEngineBuilder<R, Set, A> {
        self.parts.servos = Some(Box::new(servos));
        Self::with_parts(self.parts)
    }
}

impl<R, S> IcEngineBuilder<R, S, Missing> {
    pub fn with_arming(mut self, arming: impl Arming + 'static) -> IcEngineBuilder<R, S, Set> {
        self.parts.arming = Some(Box::new(arming));
        Self::with_parts(self.parts)
    }
}

impl IcEngineBuilder<Set, Set, Set> {
    /// Validate and build the engine. Only available when RC input, servos
    /// and arming are set.
    pub fn build(self) -> Result<IcEngine> {
        self.try_build()
    }
}
