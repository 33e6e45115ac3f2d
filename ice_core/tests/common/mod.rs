#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ice_core::builder::{IcEngineBuilder, Set};
use ice_core::{
    IcEngine, RpmCfg, StartCfg, StatusKind, StatusLink, StatusRecord, TemperatureCfg, Tick,
};
use ice_hardware::{SimServos, SimVehicle};
use ice_traits::ManualClock;

pub const START_CHAN: u8 = 3;
pub const RPM_INSTANCE: u8 = 1;
pub const TEMP_PIN: i8 = 4;
pub const OUT_EN_PIN: i8 = 17;

pub const SWITCH_OFF: u16 = 1000;
pub const SWITCH_RUN: u16 = 1500;
pub const SWITCH_START: u16 = 1900;

/// Records every status record it accepts.
pub struct CaptureLink {
    pub sent: Rc<RefCell<Vec<StatusRecord>>>,
    pub space: Rc<Cell<bool>>,
}

impl StatusLink for CaptureLink {
    fn has_space(&self, _kind: StatusKind) -> bool {
        self.space.get()
    }

    fn send(
        &mut self,
        record: &StatusRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.borrow_mut().push(*record);
        Ok(())
    }
}

/// An engine wired to simulated collaborators, with handles to drive them.
pub struct Bench {
    pub engine: IcEngine,
    pub vehicle: SimVehicle,
    pub servos: SimServos,
    pub clock: ManualClock,
    pub sent: Rc<RefCell<Vec<StatusRecord>>>,
    pub link_space: Rc<Cell<bool>>,
}

pub fn start_cfg() -> StartCfg {
    StartCfg {
        start_chan: START_CHAN,
        starter_time_ms: 3_000,
        start_delay_ms: 2_000,
        ..StartCfg::default()
    }
}

pub fn rpm_cfg() -> RpmCfg {
    RpmCfg {
        instance: RPM_INSTANCE,
        threshold_running: 100,
        threshold_starting: 0,
    }
}

pub fn temp_cfg() -> TemperatureCfg {
    TemperatureCfg {
        pin: TEMP_PIN,
        scaler: 100.0,
        ..TemperatureCfg::default()
    }
}

pub fn bench() -> Bench {
    bench_with(|b| b)
}

pub fn bench_with(
    customize: impl FnOnce(IcEngineBuilder<Set, Set, Set>) -> IcEngineBuilder<Set, Set, Set>,
) -> Bench {
    bench_with_servos(SimServos::new().with_gear(), customize)
}

pub fn bench_with_servos(
    servos: SimServos,
    customize: impl FnOnce(IcEngineBuilder<Set, Set, Set>) -> IcEngineBuilder<Set, Set, Set>,
) -> Bench {
    let vehicle = SimVehicle::new();
    let clock = ManualClock::new();
    let sent = Rc::new(RefCell::new(Vec::new()));
    let link_space = Rc::new(Cell::new(true));

    let builder = IcEngine::builder()
        .with_rc(vehicle.clone())
        .with_servos(servos.clone())
        .with_arming(vehicle.clone())
        .with_rpm_sensor(vehicle.clone())
        .with_analog(vehicle.clone())
        .with_battery(vehicle.clone())
        .with_altitude(vehicle.clone())
        .with_output_enable(vehicle.clone())
        .with_output_enable_pin(OUT_EN_PIN)
        .with_link(CaptureLink {
            sent: sent.clone(),
            space: link_space.clone(),
        })
        .with_start(start_cfg())
        .with_rpm(rpm_cfg())
        .with_temperature(temp_cfg())
        .with_clock(Box::new(clock.clone()));
    let engine = customize(builder).build().expect("bench engine builds");

    vehicle.set_armed(true);
    Bench {
        engine,
        vehicle,
        servos,
        clock,
        sent,
        link_space,
    }
}

impl Bench {
    pub fn switch(&self, pwm: u16) {
        self.vehicle.set_rc(START_CHAN, pwm);
    }

    pub fn rpm(&self, rpm: Option<f32>) {
        self.vehicle.set_rpm(RPM_INSTANCE, rpm);
    }

    pub fn tick(&mut self) -> Tick {
        self.engine.update()
    }

    /// Advance time by `ms`, then tick.
    pub fn tick_after(&mut self, ms: u64) -> Tick {
        self.clock.advance_ms(ms);
        self.engine.update()
    }

    /// Tick every `step_ms` for `total_ms`, returning all ticks.
    pub fn run_for(&mut self, total_ms: u64, step_ms: u64) -> Vec<Tick> {
        (0..total_ms / step_ms)
            .map(|_| self.tick_after(step_ms))
            .collect()
    }

    /// Drive the default configuration from `Off` to `Running`.
    pub fn start_engine(&mut self) {
        self.switch(SWITCH_START);
        self.rpm(Some(1_200.0));
        self.tick();
        self.tick_after(100);
        self.run_for(3_200, 100);
        assert_eq!(self.engine.state(), ice_core::EngineState::Running);
    }

    pub fn take_sent(&self) -> Vec<StatusRecord> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}
