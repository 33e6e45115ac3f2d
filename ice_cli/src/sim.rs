//! Scenario replay: simulated vehicle, servo rail and engine plant wired into
//! a real `IcEngine`, ticked by the core runner.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;

use ice_config::{Config, ScenarioCommand, ScenarioRow};
use ice_core::runner::{RunSummary, StopReason};
use ice_core::telemetry::{FuelType, FuelUnits};
use ice_core::util::{period_ms, secs_to_ms};
use ice_core::{
    EngineCommand, EngineState, GearCommand, GearState, IcEngine, Notice, StatusKind, StatusLink,
    StatusRecord, TemperatureCfg, TemperatureFunction, Tick,
};
use ice_hardware::{PlantParams, SimEngine, SimServos, SimVehicle};
use ice_traits::{Clock, ManualClock, MonotonicClock, ServoFunction};
use serde_json::json;

/// Run length added after the last scenario row when no duration is given.
const DEFAULT_TAIL_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    pub rate_hz: u32,
    pub duration_s: Option<f32>,
    pub realtime: bool,
    pub no_fire: bool,
    pub fuel_pct: f32,
    pub gpio: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SimReport {
    pub summary: RunSummary,
    pub restart_attempts: u32,
    pub gear: GearCommand,
    pub rejected: usize,
    pub elapsed_ms: u64,
}

pub fn stop_reason_name(r: StopReason) -> &'static str {
    match r {
        StopReason::Shutdown => "shutdown",
        StopReason::TickBudget => "duration",
        StopReason::Requested => "requested",
    }
}

pub fn gear_name(g: GearState) -> &'static str {
    match g {
        GearState::Unknown => "unknown",
        GearState::Park => "park",
        GearState::Reverse => "reverse",
        GearState::Reverse1 => "reverse_1",
        GearState::Neutral => "neutral",
        GearState::Forward => "forward",
        GearState::Forward1 => "forward_1",
        GearState::Forward2 => "forward_2",
        GearState::PwmValue => "pwm_value",
    }
}

fn status_kind_name(k: StatusKind) -> &'static str {
    match k {
        StatusKind::CoolantTemp => "coolant_temp",
        StatusKind::Transmission => "transmission",
        StatusKind::FuelLevel => "fuel_level",
    }
}

/// Voltage a coolant sender would produce at `celsius`, given the configured
/// conversion. `None` when the conversion cannot be inverted.
pub fn sensor_voltage(cfg: &TemperatureCfg, celsius: f32) -> Option<f32> {
    if cfg.scaler.abs() < f32::EPSILON {
        return None;
    }
    let v = match cfg.function {
        TemperatureFunction::Linear => celsius / cfg.scaler + cfg.offset,
        TemperatureFunction::Inverted => cfg.offset - celsius / cfg.scaler,
        TemperatureFunction::Hyperbola => {
            if celsius.abs() < f32::EPSILON {
                return None;
            }
            cfg.scaler / celsius + cfg.offset
        }
    };
    v.is_finite().then_some(v)
}

/// Status link that buffers records so they can be printed with a timestamp.
#[derive(Debug, Clone, Default)]
struct CaptureLink {
    sent: Rc<RefCell<Vec<StatusRecord>>>,
}

impl StatusLink for CaptureLink {
    fn has_space(&self, _kind: StatusKind) -> bool {
        true
    }

    fn send(
        &mut self,
        record: &StatusRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.borrow_mut().push(*record);
        Ok(())
    }
}

/// Pretty or JSON-lines event printer on stdout.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub json: bool,
}

impl Printer {
    fn transition(self, t_ms: u64, from: EngineState, to: EngineState) {
        if self.json {
            println!(
                "{}",
                json!({ "t_ms": t_ms, "event": "state", "from": from.as_str(), "to": to.as_str() })
            );
        } else {
            println!("[{t_ms:>8} ms] {from} -> {to}");
        }
    }

    fn notice(self, t_ms: u64, state: EngineState, notice: &Notice) {
        if self.json {
            println!(
                "{}",
                json!({ "t_ms": t_ms, "event": "notice", "state": state.as_str(), "message": notice.to_string() })
            );
        } else {
            println!("[{t_ms:>8} ms] {notice}");
        }
    }

    fn record(self, t_ms: u64, record: &StatusRecord) {
        let kind = status_kind_name(record.kind());
        if self.json {
            let body = match *record {
                StatusRecord::CoolantTemp {
                    temperature,
                    too_hot,
                    too_cold,
                } => json!({ "temperature": temperature, "too_hot": too_hot, "too_cold": too_cold }),
                StatusRecord::Transmission { gear, pwm } => {
                    json!({ "gear": gear_name(gear), "pwm": pwm })
                }
                StatusRecord::FuelLevel {
                    fuel_type,
                    units,
                    max,
                    level,
                } => json!({
                    "fuel_type": match fuel_type { FuelType::Gasoline => "gasoline" },
                    "units": match units { FuelUnits::Percent => "percent" },
                    "max": max,
                    "level": level,
                }),
            };
            println!(
                "{}",
                json!({ "t_ms": t_ms, "event": "status", "kind": kind, "record": body })
            );
        } else {
            let text = match *record {
                StatusRecord::CoolantTemp {
                    temperature,
                    too_hot,
                    too_cold,
                } => format!("{temperature:.1} C (hot={too_hot} cold={too_cold})"),
                StatusRecord::Transmission { gear, pwm } => format!("{} ({pwm})", gear_name(gear)),
                StatusRecord::FuelLevel { max, level, .. } => format!("{level:.1}/{max:.0} %"),
            };
            println!("[{t_ms:>8} ms] status {kind}: {text}");
        }
    }

    fn rejected(self, t_ms: u64, command: &ScenarioCommand, err: &ice_core::IceError) {
        tracing::warn!(?command, error = %err, "scenario command rejected");
        if self.json {
            println!(
                "{}",
                json!({ "t_ms": t_ms, "event": "rejected", "command": format!("{command:?}"), "reason": err.to_string() })
            );
        } else {
            println!("[{t_ms:>8} ms] command {command:?} rejected: {err}");
        }
    }

    pub fn summary(self, report: &SimReport) {
        let s = &report.summary;
        if self.json {
            println!(
                "{}",
                json!({
                    "event": "summary",
                    "ticks": s.ticks,
                    "elapsed_ms": report.elapsed_ms,
                    "final_state": s.final_state.as_str(),
                    "stop": stop_reason_name(s.stop),
                    "restart_attempts": report.restart_attempts,
                    "gear": gear_name(report.gear.state),
                    "gear_pwm": report.gear.pwm,
                    "rejected_commands": report.rejected,
                })
            );
        } else {
            println!(
                "Simulation finished after {} ticks / {} ms ({}); final state: {}, restart attempts: {}, gear: {} ({}), rejected commands: {}",
                s.ticks,
                report.elapsed_ms,
                stop_reason_name(s.stop),
                s.final_state,
                report.restart_attempts,
                gear_name(report.gear.state),
                report.gear.pwm,
                report.rejected,
            );
        }
    }
}

/// Everything the per-tick callback drives besides the engine itself.
struct Bench<'a> {
    cfg: &'a Config,
    temperature: TemperatureCfg,
    rows: &'a [ScenarioRow],
    next_row: usize,
    vehicle: SimVehicle,
    servos: SimServos,
    plant: SimEngine,
    link: CaptureLink,
    printer: Printer,
    pilot_throttle: i8,
    last_state: EngineState,
    last_t_ms: u64,
    period_ms: u64,
    rejected: usize,
}

impl Bench<'_> {
    fn feed_sensors(&self) {
        let rpm_instance = self.cfg.engine.rpm_instance;
        if rpm_instance > 0 {
            self.vehicle.set_rpm(rpm_instance, Some(self.plant.rpm()));
        }
        if self.temperature.pin > 0 {
            self.vehicle.set_analog(
                self.temperature.pin,
                sensor_voltage(&self.temperature, self.plant.coolant_c()),
            );
        }
        self.vehicle.set_battery(
            self.cfg.fuel.battery_instance,
            Some(self.plant.fuel_pct() - self.cfg.fuel.offset),
        );
    }

    /// Apply every row scheduled at or before `t_ms`.
    fn apply_due(&mut self, engine: &mut IcEngine, t_ms: u64) {
        let rows = self.rows;
        while let Some(row) = rows.get(self.next_row) {
            if row.t_ms > t_ms {
                break;
            }
            self.next_row += 1;
            if self.cfg.engine.start_chan > 0 {
                self.vehicle.set_rc(self.cfg.engine.start_chan, row.switch_pwm);
            }
            self.vehicle.set_armed(row.armed);
            self.vehicle.set_altitude(Some(row.altitude_m));
            self.pilot_throttle = row.throttle_pct;
            // Rows were validated on load.
            if let Ok(Some(command)) = row.parsed_command() {
                let cmd = engine_command(command);
                if let Err(e) = engine.handle_command(cmd) {
                    self.rejected += 1;
                    self.printer.rejected(row.t_ms, &command, &e);
                }
            }
        }
    }

    fn on_tick(&mut self, engine: &mut IcEngine, tick: &Tick) -> ControlFlow<()> {
        let t_ms = engine.now_ms();
        if tick.state != self.last_state {
            self.printer.transition(t_ms, self.last_state, tick.state);
            self.last_state = tick.state;
        }
        for n in &tick.notices {
            self.printer.notice(t_ms, tick.state, n);
        }
        for r in self.link.sent.borrow_mut().drain(..) {
            self.printer.record(t_ms, &r);
        }

        let throttle = engine
            .throttle_override(self.pilot_throttle)
            .unwrap_or(self.pilot_throttle);
        let dt = t_ms.saturating_sub(self.last_t_ms).max(self.period_ms);
        self.last_t_ms = t_ms;
        self.plant.step(
            self.servos.is_on(ServoFunction::Ignition),
            self.servos.is_on(ServoFunction::Starter),
            f32::from(throttle),
            dt,
        );
        self.feed_sensors();
        self.apply_due(engine, t_ms + self.period_ms);
        ControlFlow::Continue(())
    }
}

fn engine_command(command: ScenarioCommand) -> EngineCommand {
    match command {
        ScenarioCommand::Start => EngineCommand::EngineControl {
            start: 1.0,
            cold_start: 0.0,
            height_delay: 0.0,
        },
        ScenarioCommand::Stop => EngineCommand::EngineControl {
            start: 0.0,
            cold_start: 0.0,
            height_delay: 0.0,
        },
        ScenarioCommand::StartAtHeight(m) => EngineCommand::EngineControl {
            start: 1.0,
            cold_start: 0.0,
            height_delay: m,
        },
        ScenarioCommand::Gear(code) => EngineCommand::SetTransmissionState { gear: code, pwm: 0 },
        ScenarioCommand::GearPwm(pwm) => EngineCommand::SetTransmissionState {
            gear: GearState::PwmValue.code(),
            pwm,
        },
    }
}

/// Replay `rows` until the run length elapses or `shutdown` is raised.
pub fn run_simulation(
    cfg: &Config,
    rows: &[ScenarioRow],
    opts: &SimOptions,
    printer: Printer,
    shutdown: &AtomicBool,
) -> eyre::Result<SimReport> {
    let vehicle = SimVehicle::new();
    let servos = SimServos::new().with_gear();
    let link = CaptureLink::default();
    let clock: Box<dyn Clock + Send + Sync> = if opts.realtime {
        Box::new(MonotonicClock::new())
    } else {
        Box::new(ManualClock::new())
    };

    let builder = IcEngine::builder()
        .with_config(cfg)
        .with_clock(clock)
        .with_rc(vehicle.clone())
        .with_servos(servos.clone())
        .with_arming(vehicle.clone())
        .with_rpm_sensor(vehicle.clone())
        .with_analog(vehicle.clone())
        .with_battery(vehicle.clone())
        .with_altitude(vehicle.clone())
        .with_link(link.clone());
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let builder = if opts.gpio {
        builder.with_output_enable(ice_hardware::gpio::GpioOutputEnable::new()?)
    } else {
        builder.with_output_enable(vehicle.clone())
    };
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let builder = {
        if opts.gpio {
            tracing::warn!("built without GPIO support; using the simulated output-enable pin");
        }
        builder.with_output_enable(vehicle.clone())
    };
    let mut engine = builder.build()?;

    let mut plant = SimEngine::new(PlantParams::default());
    plant.set_will_fire(!opts.no_fire);
    plant.set_fuel_pct(opts.fuel_pct);

    let period = period_ms(opts.rate_hz.max(1));
    let last_row_ms = rows.last().map_or(0, |r| r.t_ms);
    let duration_ms = opts
        .duration_s
        .map_or(last_row_ms + DEFAULT_TAIL_MS, secs_to_ms);
    let max_ticks = duration_ms / period + 1;

    let mut bench = Bench {
        cfg,
        temperature: TemperatureCfg::from(&cfg.temperature),
        rows,
        next_row: 0,
        vehicle,
        servos,
        plant,
        link,
        printer,
        pilot_throttle: 0,
        last_state: engine.state(),
        last_t_ms: 0,
        period_ms: period,
        rejected: 0,
    };
    bench.feed_sensors();
    bench.apply_due(&mut engine, 0);
    tracing::info!(
        rows = rows.len(),
        duration_ms,
        rate_hz = opts.rate_hz,
        realtime = opts.realtime,
        "simulation start"
    );

    let summary = ice_core::runner::run(
        &mut engine,
        opts.rate_hz,
        Some(max_ticks),
        shutdown,
        |engine, tick| bench.on_tick(engine, tick),
    )?;

    Ok(SimReport {
        summary,
        restart_attempts: engine.restart_attempts(),
        gear: engine.gear(),
        rejected: bench.rejected,
        elapsed_ms: engine.now_ms(),
    })
}
