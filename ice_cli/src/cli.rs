//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ice", version, about = "Engine run/stop controller bench")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/ice_config.toml")]
    pub config: PathBuf,

    /// Emit JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario CSV against a simulated vehicle and engine
    Simulate {
        /// Scenario CSV (t_ms,switch_pwm,armed,altitude_m,throttle_pct,command)
        #[arg(long, value_name = "FILE")]
        scenario: PathBuf,
        /// Engine tick rate
        #[arg(long, value_name = "HZ", default_value_t = 50)]
        rate_hz: u32,
        /// Simulated run length; defaults to the last scenario row plus 5 s
        #[arg(long, value_name = "SECS")]
        duration_s: Option<f32>,
        /// Pace ticks against the wall clock instead of running as fast as possible
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Simulate an engine that cranks but never catches
        #[arg(long, action = ArgAction::SetTrue)]
        no_fire: bool,
        /// Initial fuel level in percent
        #[arg(long, value_name = "PCT", default_value_t = 100.0)]
        fuel_pct: f32,
        /// Drive the output-enable pin on real GPIO (Raspberry Pi)
        #[cfg(all(feature = "hardware", target_os = "linux"))]
        #[arg(long, action = ArgAction::SetTrue)]
        gpio: bool,
    },
    /// Parse and validate the config, then print the effective engine settings
    CheckConfig,
}
