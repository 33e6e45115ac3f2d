#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::prelude::*;
use std::process::Command;
use tempfile::TempDir;

/// Engine on channel 3, RPM instance 1, coolant on pin 4 (100 C per volt),
/// start confirmed at 600 rpm, two restarts.
pub const CONFIG: &str = r#"
[engine]
enable = true
start_chan = 3
rpm_instance = 1
starter_time_s = 3.0
start_delay_s = 2.0
rpm_threshold = 100
rpm_threshold_starting = 600
start_pct = 5
idle_pct = 0
restart_count = 2
options = ["arming_required_start"]

[temperature]
pin = 4
scaler = 100.0
ratiometric = false

[telemetry]
interval_ms = 1000
"#;

/// Switch to START at 0.5 s, arm at 1.5 s, select forward gear at 9 s,
/// switch off at 18 s.
pub const TAKEOFF: &str = "\
t_ms,switch_pwm,armed,altitude_m,throttle_pct,command
0,1000,false,0.0,0,
500,1900,false,0.0,0,
1500,1900,true,0.0,0,
9000,1900,true,0.0,40,gear:5
18000,1000,true,0.0,0,
";

pub fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn write_config(dir: &TempDir) -> PathBuf {
    write(dir, "ice.toml", CONFIG)
}

pub fn ice(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("ice").unwrap();
    cmd.arg("--log-level").arg("error").arg("--config").arg(cfg);
    cmd
}

/// Run `simulate --json` and parse every stdout line.
pub fn simulate_json(cfg: &PathBuf, scenario: &PathBuf, extra: &[&str]) -> Vec<serde_json::Value> {
    let out = ice(cfg)
        .arg("--json")
        .arg("simulate")
        .arg("--scenario")
        .arg(scenario)
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&out)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

pub fn events<'a>(lines: &'a [serde_json::Value], kind: &str) -> Vec<&'a serde_json::Value> {
    lines
        .iter()
        .filter(|v| v.get("event").and_then(|e| e.as_str()) == Some(kind))
        .collect()
}
