//! Fixed-rate driver for `IcEngine::update`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::{IcEngine, Tick};
use crate::error::{BuildError, Result};
use crate::state::EngineState;
use crate::util::period_ms;

/// Slowest tick rate at which the start timers stay meaningful.
pub const MIN_RATE_HZ: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised; the engine was stopped and outputs inhibited.
    Shutdown,
    /// The tick budget ran out.
    TickBudget,
    /// The per-tick callback asked to stop.
    Requested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_state: EngineState,
    pub stop: StopReason,
}

/// Tick `engine` at `rate_hz` until `shutdown` is raised, `max_ticks` ticks
/// have run, or `on_tick` breaks. Pacing uses the engine's own clock, so a
/// `ManualClock` runs the loop in simulated time.
pub fn run<F>(
    engine: &mut IcEngine,
    rate_hz: u32,
    max_ticks: Option<u64>,
    shutdown: &AtomicBool,
    mut on_tick: F,
) -> Result<RunSummary>
where
    F: FnMut(&mut IcEngine, &Tick) -> ControlFlow<()>,
{
    if rate_hz < MIN_RATE_HZ {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "rate_hz must be >= 10",
        )));
    }
    let period = Duration::from_millis(period_ms(rate_hz));
    let clock = Arc::clone(&engine.clock);
    tracing::info!(rate_hz, ?max_ticks, "engine loop start");

    let mut ticks: u64 = 0;
    let stop = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        if max_ticks.is_some_and(|m| ticks >= m) {
            break StopReason::TickBudget;
        }
        let started = clock.now();
        let tick = engine.update();
        ticks += 1;
        if on_tick(engine, &tick).is_break() {
            break StopReason::Requested;
        }
        let spent = clock.now().saturating_duration_since(started);
        clock.sleep(period.saturating_sub(spent));
    };

    if stop == StopReason::Shutdown {
        engine.controller.force_off();
        engine.init_outputs(true);
    }
    let final_state = engine.state();
    tracing::info!(ticks, ?stop, state = %final_state, "engine loop stop");
    Ok(RunSummary {
        ticks,
        final_state,
        stop,
    })
}
