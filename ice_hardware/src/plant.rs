//! A crude engine model for bench runs: the starter spins the engine up, it
//! fires after a short crank if ignition is on, and the coolant warms toward
//! operating temperature while it runs.

/// Tuning for `SimEngine`.
#[derive(Debug, Clone, Copy)]
pub struct PlantParams {
    pub cranking_rpm: f32,
    /// Cranking needed before the engine catches.
    pub fire_after_ms: u64,
    pub idle_rpm: f32,
    pub rpm_per_throttle_pct: f32,
    /// How fast RPM follows its target, in RPM per second.
    pub spool_rate: f32,
    pub ambient_c: f32,
    pub operating_c: f32,
    /// First-order time constant of the coolant, in seconds.
    pub coolant_tau_s: f32,
    pub fuel_burn_pct_per_s: f32,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            cranking_rpm: 300.0,
            fire_after_ms: 800,
            idle_rpm: 1_200.0,
            rpm_per_throttle_pct: 50.0,
            spool_rate: 3_000.0,
            ambient_c: 20.0,
            operating_c: 90.0,
            coolant_tau_s: 60.0,
            fuel_burn_pct_per_s: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimEngine {
    params: PlantParams,
    rpm: f32,
    running: bool,
    crank_ms: u64,
    coolant_c: f32,
    fuel_pct: f32,
    will_fire: bool,
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new(PlantParams::default())
    }
}

impl SimEngine {
    pub fn new(params: PlantParams) -> Self {
        Self {
            rpm: 0.0,
            running: false,
            crank_ms: 0,
            coolant_c: params.ambient_c,
            fuel_pct: 100.0,
            will_fire: true,
            params,
        }
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn coolant_c(&self) -> f32 {
        self.coolant_c
    }

    pub fn fuel_pct(&self) -> f32 {
        self.fuel_pct
    }

    /// When false, cranking never makes the engine catch.
    pub fn set_will_fire(&mut self, will_fire: bool) {
        self.will_fire = will_fire;
    }

    pub fn set_fuel_pct(&mut self, pct: f32) {
        self.fuel_pct = pct.clamp(0.0, 100.0);
    }

    pub fn set_coolant_c(&mut self, c: f32) {
        self.coolant_c = c;
    }

    /// Kill a running engine.
    pub fn stall(&mut self) {
        if self.running {
            tracing::debug!(rpm = self.rpm, "sim engine stalled");
        }
        self.running = false;
    }

    /// Advance the model by `dt_ms` with the given actuator states.
    pub fn step(&mut self, ignition: bool, starter: bool, throttle_pct: f32, dt_ms: u64) {
        let p = self.params;
        let dt_s = dt_ms as f32 / 1000.0;

        if !ignition || self.fuel_pct <= 0.0 {
            self.running = false;
        }
        if starter && !self.running {
            self.crank_ms = self.crank_ms.saturating_add(dt_ms);
            if ignition && self.will_fire && self.fuel_pct > 0.0 && self.crank_ms >= p.fire_after_ms
            {
                self.running = true;
                tracing::debug!(crank_ms = self.crank_ms, "sim engine fired");
            }
        } else {
            self.crank_ms = 0;
        }

        let target = if self.running {
            p.idle_rpm + throttle_pct.clamp(0.0, 100.0) * p.rpm_per_throttle_pct
        } else if starter {
            p.cranking_rpm
        } else {
            0.0
        };
        let max_delta = p.spool_rate * dt_s;
        self.rpm += (target - self.rpm).clamp(-max_delta, max_delta);

        let coolant_target = if self.running {
            p.operating_c
        } else {
            p.ambient_c
        };
        let alpha = (dt_s / p.coolant_tau_s.max(f32::EPSILON)).min(1.0);
        self.coolant_c += (coolant_target - self.coolant_c) * alpha;

        if self.running {
            self.fuel_pct = (self.fuel_pct - p.fuel_burn_pct_per_s * dt_s).max(0.0);
        }
    }
}
