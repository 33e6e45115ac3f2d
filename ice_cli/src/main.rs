#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod sim;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use ice_config::{Config, Logging};
use ice_core::IcEngine;
use ice_hardware::{SimServos, SimVehicle};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::sim::{Printer, SimOptions, run_simulation};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    if let Err(err) = run(&cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::error!(error = ?err, "ice exited with an error");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn run(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::CheckConfig => check_config(&cfg, cli.json),
        Commands::Simulate {
            scenario,
            rate_hz,
            duration_s,
            realtime,
            no_fire,
            fuel_pct,
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            gpio,
        } => {
            let rows = ice_config::load_scenario_csv(scenario)?;
            if let Some(d) = duration_s
                && (!d.is_finite() || *d <= 0.0)
            {
                eyre::bail!("invalid configuration: --duration-s must be > 0");
            }
            if !fuel_pct.is_finite() || !(0.0..=100.0).contains(fuel_pct) {
                eyre::bail!("invalid configuration: --fuel-pct must be in [0, 100]");
            }
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            let gpio = *gpio;
            #[cfg(not(all(feature = "hardware", target_os = "linux")))]
            let gpio = false;
            let opts = SimOptions {
                rate_hz: *rate_hz,
                duration_s: *duration_s,
                realtime: *realtime,
                no_fire: *no_fire,
                fuel_pct: *fuel_pct,
                gpio,
            };

            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                    tracing::warn!(error = %e, "failed to install Ctrl-C handler");
                }
            }

            let printer = Printer { json: cli.json };
            let report = run_simulation(&cfg, &rows, &opts, printer, &shutdown)?;
            printer.summary(&report);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = ice_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout stays a clean event stream. An optional
/// JSON file sink comes from `[logging]`. `RUST_LOG` overrides the level.
fn init_tracing(cli_level: &str, json: bool, logging: &Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(cli_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("invalid configuration: logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                "never" => tracing_appender::rolling::never(dir, name),
                other => eyre::bail!(
                    "invalid configuration: logging.rotation must be never, daily or hourly (got {other})"
                ),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

/// Build an engine from the config against simulated collaborators, so the
/// builder's own checks run too, then print the effective settings.
fn check_config(cfg: &Config, json: bool) -> eyre::Result<()> {
    let vehicle = SimVehicle::new();
    let engine = IcEngine::builder()
        .with_config(cfg)
        .with_rc(vehicle.clone())
        .with_servos(SimServos::new())
        .with_arming(vehicle)
        .build()?;
    let start = engine.controller().start_cfg();
    let e = &cfg.engine;

    if json {
        println!(
            "{}",
            json!({
                "event": "config_ok",
                "enabled": engine.is_enabled(),
                "start_chan": start.start_chan,
                "starter_time_ms": start.starter_time_ms,
                "start_delay_ms": start.start_delay_ms,
                "power_up_wait_ms": start.power_up_wait_ms,
                "restarts_allowed": start.restarts_allowed,
                "arming_required_for_ignition": start.options.arming_required_for_ignition,
                "arming_required_for_start": start.options.arming_required_for_start,
                "rpm_instance": e.rpm_instance,
                "rpm_threshold": e.rpm_threshold,
                "start_pct": e.start_pct,
                "idle_pct": e.idle_pct,
                "temperature_pin": cfg.temperature.pin,
                "telemetry_interval_ms": cfg.telemetry.interval_ms,
            })
        );
    } else {
        println!("Config OK");
        println!(
            "  enabled: {}, start channel: {}, rpm instance: {}",
            engine.is_enabled(),
            start.start_chan,
            e.rpm_instance
        );
        println!(
            "  starter: {} ms, start delay: {} ms, power-up wait: {} ms, restarts allowed: {}",
            start.starter_time_ms, start.start_delay_ms, start.power_up_wait_ms, start.restarts_allowed
        );
        println!(
            "  throttle: start {}%, idle {}%; arming required for ignition: {}, for start: {}",
            e.start_pct,
            e.idle_pct,
            start.options.arming_required_for_ignition,
            start.options.arming_required_for_start
        );
    }
    Ok(())
}
