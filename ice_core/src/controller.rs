//! The engine start/stop state machine.
//!
//! `Controller::step` maps `(state, inputs)` to the next state plus the
//! notices raised on the way. It never touches hardware, so every transition
//! is testable with plain values.

use crate::config::{RpmCfg, StartCfg};
use crate::notice::Notice;
use crate::state::{EngineState, SwitchPosition};

/// Everything the state machine looks at in one tick.
#[derive(Debug, Clone, Copy)]
pub struct ControlInputs {
    /// `None` when no start channel is configured or it reports nothing.
    pub switch: Option<SwitchPosition>,
    pub armed: bool,
    /// `None` when there is no sensor or it is unhealthy.
    pub rpm: Option<f32>,
    /// Relative altitude, positive up. Only consulted in `StartHeightDelay`.
    pub altitude: Option<f32>,
    pub now_ms: u64,
}

/// Timestamps owned by the state machine, in ms since the engine epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    /// Start of the current starter run; only set while `Starting`.
    pub starter_start_ms: Option<u64>,
    /// Last tick the starter ran. Kept across `Off`.
    pub starter_last_run_ms: Option<u64>,
    /// When the power-up wait began; only set while `StartDelay`.
    pub power_up_wait_ms: Option<u64>,
}

/// Automatic restart limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartBudget {
    attempts_made: u32,
    attempts_allowed: i32,
}

impl RestartBudget {
    pub const fn new(attempts_allowed: i32) -> Self {
        Self {
            attempts_made: 0,
            attempts_allowed,
        }
    }

    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub const fn attempts_allowed(&self) -> i32 {
        self.attempts_allowed
    }

    /// True once more attempts were made than allowed. Never true when unlimited.
    pub fn exhausted(&self) -> bool {
        u32::try_from(self.attempts_allowed).is_ok_and(|allowed| allowed < self.attempts_made)
    }

    fn record_attempt(&mut self) {
        self.attempts_made = self.attempts_made.saturating_add(1);
    }

    fn reset(&mut self) {
        self.attempts_made = 0;
    }
}

/// Delayed start waiting for the vehicle to climb.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeightTrigger {
    pub pending: bool,
    pub initial_height: f32,
    pub required_delta: f32,
}

impl HeightTrigger {
    pub const fn armed(required_delta: f32) -> Self {
        Self {
            pending: true,
            initial_height: 0.0,
            required_delta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Controller {
    state: EngineState,
    start: StartCfg,
    rpm: RpmCfg,
    idle_pct: i8,
    timers: Timers,
    budget: RestartBudget,
    height: HeightTrigger,
}

impl Controller {
    pub fn new(start: StartCfg, rpm: RpmCfg, idle_pct: i8) -> Self {
        Self {
            state: EngineState::Off,
            budget: RestartBudget::new(start.restarts_allowed),
            start,
            rpm,
            idle_pct,
            timers: Timers::default(),
            height: HeightTrigger::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn budget(&self) -> &RestartBudget {
        &self.budget
    }

    pub fn height(&self) -> &HeightTrigger {
        &self.height
    }

    pub fn start_cfg(&self) -> &StartCfg {
        &self.start
    }

    /// Evaluate one tick.
    pub fn step(&mut self, inp: &ControlInputs) -> Vec<Notice> {
        let mut notices = Vec::new();

        let Some(switch) = inp.switch else {
            if self.state != EngineState::Off {
                notices.push(Notice::StoppedCheckStarterInput);
            }
            self.force_off();
            return notices;
        };

        let opts = self.start.options;
        let ignition_ok = inp.armed || !opts.arming_required_for_ignition;
        let start_ok = inp.armed || !opts.arming_required_for_start;
        let should_be_off = switch == SwitchPosition::Off || !ignition_ok;

        if should_be_off {
            if self.state != EngineState::Off {
                notices.push(Notice::Stopped);
            }
            self.force_off();
        }

        match self.state {
            EngineState::Off => {
                if !should_be_off {
                    self.budget.reset();
                    self.state = EngineState::StartDelay;
                }
            }
            EngineState::StartHeightDelay => self.step_height_delay(inp, &mut notices),
            EngineState::StartDelay => {
                self.step_start_delay(switch, start_ok, inp.now_ms, &mut notices);
            }
            EngineState::Starting => {
                self.step_starting(start_ok, inp.rpm, inp.now_ms, &mut notices);
            }
            EngineState::Running => self.step_running(start_ok, inp.rpm, &mut notices),
        }

        if self.state != EngineState::Starting {
            self.timers.starter_start_ms = None;
        }
        if self.state != EngineState::StartDelay {
            self.timers.power_up_wait_ms = None;
        }
        notices
    }

    fn step_height_delay(&mut self, inp: &ControlInputs, notices: &mut Vec<Notice>) {
        let Some(alt) = inp.altitude else {
            return;
        };
        if self.height.pending || !inp.armed {
            self.height.pending = false;
            self.height.initial_height = alt;
        } else if alt - self.height.initial_height >= self.height.required_delta {
            notices.push(Notice::HeightReached {
                climbed_m: alt - self.height.initial_height,
            });
            self.height = HeightTrigger::default();
            self.state = EngineState::Starting;
        }
    }

    fn step_start_delay(
        &mut self,
        switch: SwitchPosition,
        start_ok: bool,
        now: u64,
        notices: &mut Vec<Notice>,
    ) {
        if switch != SwitchPosition::AccessoryRunAndStart || !start_ok {
            return;
        }
        if self.budget.exhausted() {
            return;
        }

        let wait = self.start.power_up_wait_ms;
        if wait > 0 {
            match self.timers.power_up_wait_ms {
                None => {
                    notices.push(Notice::WaitingForPowerUp {
                        secs: wait / crate::util::MILLIS_PER_SEC,
                    });
                    self.timers.power_up_wait_ms = Some(now);
                    return;
                }
                Some(since) if now.saturating_sub(since) < wait => return,
                Some(_) => {}
            }
        }

        let delay_elapsed = self.start.start_delay_ms == 0
            || self
                .timers
                .starter_last_run_ms
                .is_none_or(|last| now.saturating_sub(last) >= self.start.start_delay_ms);
        if delay_elapsed {
            notices.push(Notice::Starting {
                up_to_s: self.start.starter_time_ms as f32 / 1000.0,
            });
            self.state = EngineState::Starting;
        }
    }

    fn step_starting(
        &mut self,
        start_ok: bool,
        rpm: Option<f32>,
        now: u64,
        notices: &mut Vec<Notice>,
    ) {
        let started_at = match self.timers.starter_start_ms {
            Some(t) => t,
            None => {
                self.budget.record_attempt();
                self.timers.starter_start_ms = Some(now);
                now
            }
        };
        self.timers.starter_last_run_ms = Some(now);

        let threshold = self.rpm.threshold_starting;
        if !start_ok {
            notices.push(Notice::Stopped);
            self.state = EngineState::StartDelay;
        } else if threshold > 0 && rpm.is_some_and(|r| r >= threshold as f32) {
            notices.push(Notice::Running { rpm });
            self.state = EngineState::Running;
        } else if now.saturating_sub(started_at) >= self.start.starter_time_ms {
            if threshold > 0 {
                notices.push(Notice::StartFailed);
                self.state = EngineState::StartDelay;
            } else {
                notices.push(Notice::Running { rpm: None });
                self.state = EngineState::Running;
            }
        }
    }

    fn step_running(&mut self, start_ok: bool, rpm: Option<f32>, notices: &mut Vec<Notice>) {
        if !start_ok && self.idle_pct <= 0 {
            self.force_off();
            return;
        }
        let threshold = self.rpm.threshold_running;
        if let Some(r) = rpm
            && threshold > 0
            && r < threshold as f32
        {
            notices.push(Notice::Died { rpm: r });
            self.state = EngineState::StartDelay;
        }
    }

    /// Drop to `Off`, abandoning any per-state timers and the restart count.
    pub fn force_off(&mut self) {
        self.state = EngineState::Off;
        self.budget.reset();
        self.timers.starter_start_ms = None;
        self.timers.power_up_wait_ms = None;
        self.height = HeightTrigger::default();
    }

    /// Wait for the vehicle to climb `delta` metres before starting.
    pub fn begin_height_delay(&mut self, delta: f32) {
        self.height = HeightTrigger::armed(delta);
        self.state = EngineState::StartHeightDelay;
        self.timers.power_up_wait_ms = None;
    }

    /// Crank immediately unless already running. Skips the start delay and
    /// the restart budget check.
    pub fn begin_starting(&mut self) {
        if self.state != EngineState::Running {
            self.height = HeightTrigger::default();
            self.state = EngineState::Starting;
            self.timers.power_up_wait_ms = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;

    fn ctl(start: StartCfg) -> Controller {
        Controller::new(
            StartCfg {
                start_chan: 3,
                ..start
            },
            RpmCfg::default(),
            0,
        )
    }

    fn at(now_ms: u64, switch: SwitchPosition) -> ControlInputs {
        ControlInputs {
            switch: Some(switch),
            armed: true,
            rpm: None,
            altitude: None,
            now_ms,
        }
    }

    #[test]
    fn budget_exhaustion_semantics() {
        let mut b = RestartBudget::new(1);
        assert!(!b.exhausted());
        b.record_attempt();
        assert!(!b.exhausted());
        b.record_attempt();
        assert!(b.exhausted());
        b.reset();
        assert!(!b.exhausted());

        let mut unlimited = RestartBudget::new(-1);
        for _ in 0..1000 {
            unlimited.record_attempt();
        }
        assert!(!unlimited.exhausted());
    }

    #[test]
    fn power_up_wait_arms_once_then_elapses() {
        let mut c = ctl(StartCfg {
            power_up_wait_ms: 2_000,
            start_delay_ms: 0,
            ..StartCfg::default()
        });
        let start = SwitchPosition::AccessoryRunAndStart;
        assert!(c.step(&at(0, start)).is_empty());
        assert_eq!(c.state(), EngineState::StartDelay);

        let n = c.step(&at(100, start));
        assert_eq!(n, vec![Notice::WaitingForPowerUp { secs: 2 }]);
        assert_eq!(c.timers().power_up_wait_ms, Some(100));

        assert!(c.step(&at(1_000, start)).is_empty());
        let n = c.step(&at(2_100, start));
        assert_eq!(n, vec![Notice::Starting { up_to_s: 3.0 }]);
        assert_eq!(c.state(), EngineState::Starting);

        c.step(&at(2_200, start));
        assert_eq!(c.timers().power_up_wait_ms, None);
    }

    #[test]
    fn arming_required_for_ignition_forces_off() {
        let mut c = ctl(StartCfg {
            options: EngineOptions {
                arming_required_for_ignition: true,
                arming_required_for_start: false,
            },
            ..StartCfg::default()
        });
        c.step(&at(0, SwitchPosition::AccessoryRun));
        assert_eq!(c.state(), EngineState::StartDelay);
        let mut disarmed = at(100, SwitchPosition::AccessoryRun);
        disarmed.armed = false;
        assert_eq!(c.step(&disarmed), vec![Notice::Stopped]);
        assert_eq!(c.state(), EngineState::Off);
        assert!(c.step(&disarmed).is_empty());
    }

    #[test]
    fn height_trigger_cleared_once_climb_completes() {
        let mut c = ctl(StartCfg::default());
        let run = SwitchPosition::AccessoryRun;
        c.step(&at(0, run));
        c.begin_height_delay(5.0);
        let mut inp = at(100, run);
        inp.altitude = Some(2.0);
        c.step(&inp);
        assert_eq!(c.height().initial_height, 2.0);

        inp.now_ms = 200;
        inp.altitude = Some(7.5);
        assert_eq!(c.step(&inp), vec![Notice::HeightReached { climbed_m: 5.5 }]);
        assert_eq!(c.state(), EngineState::Starting);
        assert_eq!(*c.height(), HeightTrigger::default());
    }
}
