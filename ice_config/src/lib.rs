#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and scenario parsing for the engine controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The options bitmask is accepted either as an integer or as a list of
//!   option names; it stays a bitmask here and becomes named flags in the core.
//! - Scenario CSV loader enforces headers and time ordering for the simulator.
use serde::Deserialize;
use serde::de::Deserializer;

/// Options bit: vehicle must be armed before ignition is energized.
pub const OPTION_ARMING_REQUIRED_IGNITION: u32 = 1 << 0;
/// Options bit: vehicle must be armed before the starter may run.
pub const OPTION_ARMING_REQUIRED_START: u32 = 1 << 1;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Master enable for engine control.
    pub enable: bool,
    /// RC input channel (1-based) for the pilot start switch, 0 for none.
    pub start_chan: u8,
    /// RPM sensor instance (1-based), 0 for none.
    pub rpm_instance: u8,
    /// Seconds to run the starter per attempt.
    pub starter_time_s: f32,
    /// Seconds between start attempts.
    pub start_delay_s: f32,
    /// RPM below which a running engine is considered stopped.
    pub rpm_threshold: i32,
    /// RPM above which a start is confirmed early, 0 to always crank the full starter time.
    pub rpm_threshold_starting: i32,
    /// Throttle percentage held while starting.
    pub start_pct: i8,
    /// Minimum throttle percentage while running.
    pub idle_pct: i8,
    /// Seconds to wait after energizing accessories before cranking.
    pub power_up_wait_s: u16,
    /// Automatic restart attempts allowed, -1 for unlimited.
    pub restart_count: i8,
    /// Bitmask of `OPTION_*` flags. Also accepts a list of option names.
    #[serde(deserialize_with = "de_options")]
    pub options: u32,
    /// GPIO driving the master output-enable line, -1 for none.
    pub output_enable_pin: i8,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            enable: false,
            start_chan: 0,
            rpm_instance: 0,
            starter_time_s: 3.0,
            start_delay_s: 2.0,
            rpm_threshold: 100,
            rpm_threshold_starting: 0,
            start_pct: 5,
            idle_pct: 0,
            power_up_wait_s: 0,
            restart_count: -1,
            options: 0,
            output_enable_pin: -1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureFunction {
    /// (v - offset) * scaler
    #[default]
    Linear,
    /// (offset - v) * scaler
    Inverted,
    /// scaler / (v - offset)
    #[serde(alias = "hyperbolic")]
    Hyperbola,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemperatureSection {
    /// Analog input pin, <= 0 disables the sensor.
    pub pin: i8,
    pub scaler: f32,
    /// Overheat limit in degC.
    pub max: i16,
    /// Too-cold limit in degC.
    pub min: i16,
    pub ratiometric: bool,
    /// Sensor offset in volts.
    pub offset: f32,
    pub function: TemperatureFunction,
    /// Throttle multiplier applied while overheating (0.0..=1.0).
    pub too_hot_throttle_factor: f32,
}

impl Default for TemperatureSection {
    fn default() -> Self {
        Self {
            pin: -1,
            scaler: 1.0,
            max: 105,
            min: 10,
            ratiometric: true,
            offset: 0.0,
            function: TemperatureFunction::Linear,
            too_hot_throttle_factor: 0.25,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FuelSection {
    /// Added to the battery-monitor voltage to make up for its missing offset.
    pub offset: f32,
    /// Battery-monitor instance carrying the fuel level.
    pub battery_instance: u8,
}

impl Default for FuelSection {
    fn default() -> Self {
        Self {
            offset: 0.0,
            battery_instance: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    /// Minimum interval between status records of the same kind.
    pub interval_ms: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub engine: EngineSection,
    #[serde(default)]
    pub temperature: TemperatureSection,
    #[serde(default)]
    pub fuel: FuelSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionsToml {
    Bits(u32),
    Names(Vec<String>),
}

fn option_bit(name: &str) -> Option<u32> {
    match name {
        "arming_required_ignition" => Some(OPTION_ARMING_REQUIRED_IGNITION),
        "arming_required_start" => Some(OPTION_ARMING_REQUIRED_START),
        _ => None,
    }
}

fn de_options<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match OptionsToml::deserialize(deserializer)? {
        OptionsToml::Bits(bits) => Ok(bits),
        OptionsToml::Names(names) => {
            let mut bits = 0;
            for n in names {
                bits |= option_bit(n.trim()).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown engine option '{n}'"))
                })?;
            }
            Ok(bits)
        }
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        let e = &self.engine;
        // Engine timing
        if !e.starter_time_s.is_finite() || !(0.1..=5.0).contains(&e.starter_time_s) {
            eyre::bail!("engine.starter_time_s must be in [0.1, 5.0]");
        }
        if !e.start_delay_s.is_finite() || e.start_delay_s < 0.0 {
            eyre::bail!("engine.start_delay_s must be >= 0");
        }
        if e.start_delay_s > 60.0 {
            eyre::bail!("engine.start_delay_s is unreasonably large (>60s)");
        }
        if e.power_up_wait_s > 20 {
            eyre::bail!("engine.power_up_wait_s must be in [0, 20]");
        }
        if !(-1..=100).contains(&e.restart_count) {
            eyre::bail!("engine.restart_count must be in [-1, 100]");
        }

        // Engine throttle and RPM
        if !(0..=100).contains(&e.start_pct) {
            eyre::bail!("engine.start_pct must be in [0, 100]");
        }
        if !(0..=100).contains(&e.idle_pct) {
            eyre::bail!("engine.idle_pct must be in [0, 100]");
        }
        if e.rpm_threshold < 0 {
            eyre::bail!("engine.rpm_threshold must be >= 0");
        }
        if e.rpm_threshold_starting < 0 {
            eyre::bail!("engine.rpm_threshold_starting must be >= 0");
        }
        let known = OPTION_ARMING_REQUIRED_IGNITION | OPTION_ARMING_REQUIRED_START;
        if e.options & !known != 0 {
            eyre::bail!("engine.options has unknown bits set: {:#x}", e.options & !known);
        }

        // Temperature
        let t = &self.temperature;
        if !t.scaler.is_finite() {
            eyre::bail!("temperature.scaler must be finite");
        }
        if !t.offset.is_finite() {
            eyre::bail!("temperature.offset must be finite");
        }
        if !t.too_hot_throttle_factor.is_finite()
            || !(0.0..=1.0).contains(&t.too_hot_throttle_factor)
        {
            eyre::bail!("temperature.too_hot_throttle_factor must be in [0.0, 1.0]");
        }
        if t.min > t.max {
            eyre::bail!("temperature.min must be <= temperature.max");
        }

        // Fuel
        if !self.fuel.offset.is_finite() {
            eyre::bail!("fuel.offset must be finite");
        }

        // Telemetry
        if self.telemetry.interval_ms == 0 {
            eyre::bail!("telemetry.interval_ms must be >= 1");
        }

        Ok(())
    }
}

/// External command scheduled at a scenario row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScenarioCommand {
    Start,
    Stop,
    /// Start once the vehicle has climbed this many metres.
    StartAtHeight(f32),
    /// Transmission gear code.
    Gear(u8),
    /// Transmission explicit pulse width.
    GearPwm(u16),
}

impl std::str::FromStr for ScenarioCommand {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((n, a)) => (n.trim(), Some(a.trim())),
            None => (s, None),
        };
        let need_arg = || arg.ok_or_else(|| eyre::eyre!("command '{name}' needs an argument"));
        match name {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "start_height" => {
                let m: f32 = need_arg()?
                    .parse()
                    .map_err(|e| eyre::eyre!("start_height: {e}"))?;
                if !m.is_finite() || m <= 0.0 {
                    eyre::bail!("start_height must be > 0");
                }
                Ok(Self::StartAtHeight(m))
            }
            "gear" => Ok(Self::Gear(
                need_arg()?.parse().map_err(|e| eyre::eyre!("gear: {e}"))?,
            )),
            "gear_pwm" => Ok(Self::GearPwm(
                need_arg()?
                    .parse()
                    .map_err(|e| eyre::eyre!("gear_pwm: {e}"))?,
            )),
            other => eyre::bail!("unknown scenario command '{other}'"),
        }
    }
}

/// Scenario CSV schema.
///
/// Expected headers:
/// t_ms,switch_pwm,armed,altitude_m,throttle_pct,command
///
/// Example:
/// t_ms,switch_pwm,armed,altitude_m,throttle_pct,command
/// 0,1000,false,0.0,0,
/// 500,1800,true,0.0,0,
/// 9000,1800,true,0.0,40,gear:6
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioRow {
    pub t_ms: u64,
    pub switch_pwm: u16,
    pub armed: bool,
    pub altitude_m: f32,
    pub throttle_pct: i8,
    #[serde(default)]
    pub command: Option<String>,
}

impl ScenarioRow {
    /// Parse the optional command column.
    pub fn parsed_command(&self) -> eyre::Result<Option<ScenarioCommand>> {
        match self.command.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(c) => c.parse().map(Some),
        }
    }
}

pub const SCENARIO_HEADERS: [&str; 6] = [
    "t_ms",
    "switch_pwm",
    "armed",
    "altitude_m",
    "throttle_pct",
    "command",
];

/// Check time ordering and command syntax of scenario rows.
pub fn validate_scenario(rows: &[ScenarioRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("scenario requires at least one row");
    }
    for (i, pair) in rows.windows(2).enumerate() {
        if pair[1].t_ms < pair[0].t_ms {
            eyre::bail!(
                "scenario t_ms must be non-decreasing (row {} at {} ms after {} ms)",
                i + 3,
                pair[1].t_ms,
                pair[0].t_ms
            );
        }
    }
    for (i, r) in rows.iter().enumerate() {
        if !r.altitude_m.is_finite() {
            eyre::bail!("scenario row {}: altitude_m must be finite", i + 2);
        }
        r.parsed_command()
            .map_err(|e| eyre::eyre!("scenario row {}: {e}", i + 2))?;
    }
    Ok(())
}

pub fn load_scenario_csv(path: &std::path::Path) -> eyre::Result<Vec<ScenarioRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open scenario CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != SCENARIO_HEADERS {
        eyre::bail!(
            "scenario CSV must have headers '{}', got: {}",
            SCENARIO_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScenarioRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_scenario(&rows)?;
    Ok(rows)
}
