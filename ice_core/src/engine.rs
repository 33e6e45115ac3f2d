//! `IcEngine`: owns the collaborators and runs one control tick per `update()`.

use std::sync::Arc;
use std::time::Instant;

use ice_traits::{
    AltitudeSource, AnalogSource, Arming, BatteryMonitor, Clock, DigitalOut, RcInput, RpmSensor,
    ServoFunction, ServoOutputs,
};

use crate::config::ThrottleCfg;
use crate::controller::{ControlInputs, Controller};
use crate::filter::{FuelSensor, TemperatureSensor};
use crate::hw_error::best_effort;
use crate::notice::Notice;
use crate::output::{GearCommand, OutputMapper};
use crate::overrides::{OverrideProvider, ThrottleContext, brake_override};
use crate::state::{EngineState, SwitchPosition};
use crate::telemetry::{StatusLink, StatusSnapshot, TelemetryReporter};

/// What happened during one `update()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub state: EngineState,
    pub notices: Vec<Notice>,
    /// Status records accepted by the links this tick.
    pub records_sent: usize,
}

pub struct IcEngine {
    pub(crate) enabled: bool,
    pub(crate) run_once: bool,
    pub(crate) output_enable_pin: i8,

    pub(crate) rc: Box<dyn RcInput>,
    pub(crate) arming: Box<dyn Arming>,
    pub(crate) rpm_sensor: Box<dyn RpmSensor>,
    pub(crate) analog: Box<dyn AnalogSource>,
    pub(crate) battery: Box<dyn BatteryMonitor>,
    pub(crate) altitude: Box<dyn AltitudeSource>,
    pub(crate) servos: Box<dyn ServoOutputs>,
    pub(crate) output_enable: Option<Box<dyn DigitalOut>>,
    pub(crate) links: Vec<Box<dyn StatusLink>>,

    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,

    pub(crate) controller: Controller,
    pub(crate) temperature: TemperatureSensor,
    pub(crate) fuel: FuelSensor,
    pub(crate) outputs: OutputMapper,
    pub(crate) overrides: OverrideProvider,
    pub(crate) telemetry: TelemetryReporter,
    pub(crate) throttle: ThrottleCfg,
    pub(crate) rpm_instance: u8,
    pub(crate) pending: Vec<Notice>,
}

impl core::fmt::Debug for IcEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IcEngine")
            .field("enabled", &self.enabled)
            .field("state", &self.controller.state())
            .field("gear", &self.outputs.gear())
            .field("attempts", &self.controller.budget().attempts_made())
            .finish_non_exhaustive()
    }
}

impl IcEngine {
    /// Milliseconds since the engine was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn state(&self) -> EngineState {
        self.controller.state()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the module. Takes effect on the next `update()`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn gear(&self) -> GearCommand {
        self.outputs.gear()
    }

    pub fn restart_attempts(&self) -> u32 {
        self.controller.budget().attempts_made()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature.temperature(self.now_ms())
    }

    pub fn too_hot(&self) -> bool {
        self.temperature.too_hot(self.now_ms())
    }

    pub fn too_cold(&self) -> bool {
        self.temperature.too_cold(self.now_ms())
    }

    pub fn fuel_level(&self) -> Option<f32> {
        self.fuel.level(self.now_ms())
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        tracing::info!(state = %self.controller.state(), "{notice}");
        self.pending.push(notice);
    }

    /// Run one control tick.
    pub fn update(&mut self) -> Tick {
        if !self.enabled {
            self.controller.force_off();
            if self.run_once {
                self.run_once = false;
                self.init_outputs(true);
            }
            return Tick {
                state: EngineState::Off,
                notices: std::mem::take(&mut self.pending),
                records_sent: 0,
            };
        }
        if !self.run_once {
            self.run_once = true;
            self.init_outputs(false);
        }

        let now = self.now_ms();
        self.temperature.update(self.analog.as_mut(), now);
        self.fuel.update(self.battery.as_ref(), now);

        let before = self.controller.state();
        let inputs = self.control_inputs(now);
        for n in self.controller.step(&inputs) {
            self.notify(n);
        }
        let state = self.controller.state();
        if state != before {
            tracing::debug!(from = %before, to = %state, now_ms = now, "engine state changed");
        }

        self.outputs.apply(state, self.servos.as_mut());
        let records_sent = self.send_status(now);

        Tick {
            state,
            notices: std::mem::take(&mut self.pending),
            records_sent,
        }
    }

    fn control_inputs(&self, now_ms: u64) -> ControlInputs {
        let start_chan = self.controller.start_cfg().start_chan;
        let switch = if start_chan == 0 {
            None
        } else {
            self.rc.radio_in(start_chan).map(SwitchPosition::from_pwm)
        };
        let rpm = if self.rpm_instance == 0 {
            None
        } else {
            self.rpm_sensor.rpm(self.rpm_instance)
        };
        let altitude = if self.controller.state() == EngineState::StartHeightDelay {
            self.altitude.relative_altitude()
        } else {
            None
        };
        ControlInputs {
            switch,
            armed: self.arming.is_armed(),
            rpm,
            altitude,
            now_ms,
        }
    }

    /// Drive the output-enable pin and apply outputs for the current state.
    /// `inhibit` holds actuators at their safe level.
    pub fn init_outputs(&mut self, inhibit: bool) {
        if let Ok(pin) = u8::try_from(self.output_enable_pin)
            && let Some(out) = self.output_enable.as_mut()
        {
            best_effort(out.write(pin, inhibit), "output enable");
        }
        self.outputs
            .apply(self.controller.state(), self.servos.as_mut());
    }

    fn send_status(&mut self, now_ms: u64) -> usize {
        let cfg = self.temperature.cfg();
        let snap = StatusSnapshot {
            temperature: self.temperature.temperature(now_ms),
            temp_max: cfg.max,
            temp_min: cfg.min,
            gear: self.outputs.gear().state,
            gear_pwm: self.servos.output_pwm(ServoFunction::EngineGear),
            fuel_level: self.fuel.level(now_ms),
        };
        self.telemetry.report(now_ms, &snap, &mut self.links)
    }

    /// Brake request for the vehicle mixer.
    pub fn brake_override(&self) -> Option<f32> {
        brake_override(self.enabled, self.controller.state())
    }

    /// Throttle request for the vehicle mixer given its current command.
    pub fn throttle_override(&mut self, current_pct: i8) -> Option<i8> {
        let now = self.now_ms();
        let ctx = ThrottleContext {
            enabled: self.enabled,
            state: self.controller.state(),
            start_pct: self.throttle.start_pct,
            idle_pct: self.throttle.idle_pct,
            too_hot: self.temperature.too_hot(now),
            too_cold: self.temperature.too_cold(now),
            too_hot_factor: self.temperature.cfg().too_hot_throttle_factor,
        };
        let (pct, notice) = self.overrides.throttle(&ctx, current_pct, now);
        if let Some(n) = notice {
            self.notify(n);
        }
        pct
    }
}
