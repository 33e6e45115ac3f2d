//! Rate-limited engine status records for outbound links.

use crate::error::IceError;
use crate::output::GearState;

/// Coolant temperature sent when the sensor is unhealthy.
pub const TEMPERATURE_INVALID: f32 = -999.0;
/// Fuel level sent when the battery monitor is unhealthy.
pub const FUEL_LEVEL_INVALID: f32 = -1.0;
pub const FUEL_LEVEL_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    CoolantTemp = 0,
    Transmission = 1,
    FuelLevel = 2,
}

impl StatusKind {
    pub const ALL: [Self; 3] = [Self::CoolantTemp, Self::Transmission, Self::FuelLevel];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Gasoline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelUnits {
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusRecord {
    CoolantTemp {
        temperature: f32,
        too_hot: i16,
        too_cold: i16,
    },
    Transmission {
        gear: GearState,
        pwm: u16,
    },
    FuelLevel {
        fuel_type: FuelType,
        units: FuelUnits,
        max: f32,
        level: f32,
    },
}

impl StatusRecord {
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::CoolantTemp { .. } => StatusKind::CoolantTemp,
            Self::Transmission { .. } => StatusKind::Transmission,
            Self::FuelLevel { .. } => StatusKind::FuelLevel,
        }
    }
}

/// An outbound channel (telemetry radio, companion link, log sink).
pub trait StatusLink {
    /// Inactive links are skipped entirely.
    fn is_active(&self) -> bool {
        true
    }

    /// Room for one more `kind` record right now.
    fn has_space(&self, kind: StatusKind) -> bool;

    fn send(&mut self, record: &StatusRecord)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Values the reporter turns into records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub temperature: Option<f32>,
    pub temp_max: i16,
    pub temp_min: i16,
    pub gear: GearState,
    /// `None` when the gear output reports no PWM; the record is then skipped.
    pub gear_pwm: Option<u16>,
    pub fuel_level: Option<f32>,
}

impl StatusSnapshot {
    pub fn record(&self, kind: StatusKind) -> Option<StatusRecord> {
        match kind {
            StatusKind::CoolantTemp => Some(StatusRecord::CoolantTemp {
                temperature: self.temperature.unwrap_or(TEMPERATURE_INVALID),
                too_hot: self.temp_max,
                too_cold: self.temp_min,
            }),
            StatusKind::Transmission => self.gear_pwm.map(|pwm| StatusRecord::Transmission {
                gear: self.gear,
                pwm,
            }),
            StatusKind::FuelLevel => Some(StatusRecord::FuelLevel {
                fuel_type: FuelType::Gasoline,
                units: FuelUnits::Percent,
                max: FUEL_LEVEL_MAX,
                level: self.fuel_level.unwrap_or(FUEL_LEVEL_INVALID),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryReporter {
    interval_ms: u64,
    force: bool,
    last_send_ms: [Option<u64>; 3],
    last_error: Option<IceError>,
}

impl TelemetryReporter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            force: false,
            last_send_ms: [None; 3],
            last_error: None,
        }
    }

    /// Send every kind on the next pass regardless of the rate limit.
    pub fn force_next(&mut self) {
        self.force = true;
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn last_send_ms(&self, kind: StatusKind) -> Option<u64> {
        self.last_send_ms[kind as usize]
    }

    /// Most recent link failure, kept until the next accepted send.
    pub fn last_error(&self) -> Option<&IceError> {
        self.last_error.as_ref()
    }

    fn due(&self, kind: StatusKind, now_ms: u64, force: bool) -> bool {
        force
            || self.last_send_ms[kind as usize]
                .is_none_or(|t| now_ms.saturating_sub(t) >= self.interval_ms)
    }

    /// One report pass. Returns how many records the links accepted.
    pub fn report(
        &mut self,
        now_ms: u64,
        snap: &StatusSnapshot,
        links: &mut [Box<dyn StatusLink>],
    ) -> usize {
        let force = std::mem::take(&mut self.force);
        let mut sent = [false; 3];
        let mut accepted = 0;

        for link in links.iter_mut().filter(|l| l.is_active()) {
            for kind in StatusKind::ALL {
                if !self.due(kind, now_ms, force) || !link.has_space(kind) {
                    continue;
                }
                let Some(record) = snap.record(kind) else {
                    continue;
                };
                match link.send(&record) {
                    Ok(()) => {
                        sent[kind as usize] = true;
                        accepted += 1;
                        self.last_error = None;
                    }
                    Err(e) => {
                        let err = IceError::Link(e.to_string());
                        tracing::warn!(error = %err, ?kind, "status send failed");
                        self.last_error = Some(err);
                    }
                }
            }
        }

        for kind in StatusKind::ALL {
            if sent[kind as usize] {
                self.last_send_ms[kind as usize] = Some(now_ms);
            }
        }
        accepted
    }
}
