mod common;

use assert_cmd::prelude::*;
use common::{TAKEOFF, ice, write, write_config};
use predicates::prelude::*;
use rstest::rstest;
use std::process::Command;
use tempfile::tempdir;

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check-config"], 0, "Config OK", "stdout")]
#[case(&["simulate"], 2, "required", "stderr")]
#[case(&["simulate", "--scenario", "SCENARIO"], 0, "Engine running!", "stdout")]
#[case(&["simulate", "--scenario", "SCENARIO", "--rate-hz", "5"], 2, "rate_hz must be >= 10", "stderr")]
#[case(&["simulate", "--scenario", "SCENARIO", "--duration-s", "0"], 2, "--duration-s must be > 0", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let scenario = write(&dir, "takeoff.csv", TAKEOFF);

    // Always include a valid config to avoid relying on the default path
    let mut cmd = ice(&cfg);
    for a in args {
        if *a == "SCENARIO" {
            cmd.arg(&scenario);
        } else {
            cmd.arg(a);
        }
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn out_of_range_config_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write(
        &dir,
        "bad.toml",
        "[engine]\nenable = true\nstart_chan = 3\nidle_pct = 150\n",
    );

    ice(&cfg)
        .arg("check-config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("What happened: Configuration is invalid"))
        .stderr(predicate::str::contains("engine.idle_pct must be in [0, 100]"));
}

#[rstest]
fn missing_engine_section_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let cfg = write(&dir, "empty.toml", "[telemetry]\ninterval_ms = 500\n");

    ice(&cfg)
        .arg("check-config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse config"));
}

#[rstest]
fn missing_config_file_is_reported() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    Command::cargo_bin("ice")
        .unwrap()
        .arg("--config")
        .arg(&missing)
        .arg("check-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not be read"));
}

#[rstest]
fn cli_reports_bad_scenario_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let bad = write(&dir, "bad.csv", "t_ms,switch,armed\n0,1000,false\n");

    ice(&cfg)
        .arg("simulate")
        .arg("--scenario")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers in scenario CSV"));
}

#[rstest]
#[case("t_ms,switch_pwm,armed,altitude_m,throttle_pct,command\n500,1000,false,0.0,0,\n100,1000,false,0.0,0,\n")]
#[case("t_ms,switch_pwm,armed,altitude_m,throttle_pct,command\n0,1000,false,0.0,0,choke\n")]
#[case("t_ms,switch_pwm,armed,altitude_m,throttle_pct,command\n0,1000,false,0.0,0,start_height:-2\n")]
fn malformed_scenarios_fail_before_running(#[case] csv: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let scenario = write(&dir, "bad.csv", csv);

    ice(&cfg)
        .arg("simulate")
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("scenario"))
        .stdout(predicate::str::contains("Simulation finished").not());
}

#[rstest]
fn json_mode_prints_error_object() {
    let dir = tempdir().unwrap();
    let cfg = write(&dir, "bad.toml", "[engine]\nstarter_time_s = 9.0\n");

    let out = ice(&cfg)
        .arg("--json")
        .arg("check-config")
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let line = String::from_utf8_lossy(&out).trim().to_string();
    let v: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");
    assert_eq!(v["event"], "error");
    assert_eq!(v["reason"], "InvalidConfig");
    assert!(
        v["message"]
            .as_str()
            .is_some_and(|m| m.contains("engine.starter_time_s"))
    );
}
