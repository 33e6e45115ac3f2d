//! Throttle and brake overrides offered to the vehicle's mixer.

use crate::notice::Notice;
use crate::state::EngineState;

/// Brake held while cranking.
pub const BRAKE_START_PCT: f32 = 100.0;
/// Minimum spacing of repeated throttle override notices.
pub const OVERRIDE_NOTICE_INTERVAL_MS: u64 = 10_000;

/// Engine-side facts the throttle override depends on.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleContext {
    pub enabled: bool,
    pub state: EngineState,
    pub start_pct: i8,
    pub idle_pct: i8,
    pub too_hot: bool,
    pub too_cold: bool,
    pub too_hot_factor: f32,
}

/// Brake request: `Some(100)` while enabled and cranking.
pub fn brake_override(enabled: bool, state: EngineState) -> Option<f32> {
    (enabled && state == EngineState::Starting).then_some(BRAKE_START_PCT)
}

fn decide(ctx: &ThrottleContext, current_pct: i8) -> Option<i8> {
    if !ctx.enabled {
        return None;
    }
    if ctx.state == EngineState::Running
        && ctx.idle_pct > 0
        && ctx.idle_pct < 100
        && ctx.idle_pct > current_pct
    {
        return Some(ctx.idle_pct);
    }
    if matches!(ctx.state, EngineState::Starting | EngineState::StartDelay) {
        Some(ctx.start_pct)
    } else if ctx.too_cold {
        Some(0)
    } else if ctx.too_hot {
        let factor = ctx.too_hot_factor.clamp(0.0, 1.0);
        Some((f32::from(current_pct) * factor) as i8)
    } else {
        None
    }
}

/// Stateful only for notice throttling; the decision itself is pure.
#[derive(Debug, Clone, Default)]
pub struct OverrideProvider {
    last_returned: Option<i8>,
    last_notice: Option<(u64, EngineState)>,
}

impl OverrideProvider {
    /// Decide the throttle override for `current_pct` and, when due, the
    /// notice describing it.
    pub fn throttle(
        &mut self,
        ctx: &ThrottleContext,
        current_pct: i8,
        now_ms: u64,
    ) -> (Option<i8>, Option<Notice>) {
        let decided = decide(ctx, current_pct);
        let prev = std::mem::replace(&mut self.last_returned, decided);
        let Some(pct) = decided else {
            return (None, None);
        };
        let due = prev != Some(pct)
            || match self.last_notice {
                None => true,
                Some((at, state)) => {
                    state != ctx.state || now_ms.saturating_sub(at) > OVERRIDE_NOTICE_INTERVAL_MS
                }
            };
        let notice = due.then(|| {
            self.last_notice = Some((now_ms, ctx.state));
            Notice::ThrottleOverride {
                from: current_pct,
                to: pct,
            }
        });
        (Some(pct), notice)
    }
}
