use std::fs::File;
use std::io::Write;

use ice_config::{ScenarioCommand, load_scenario_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.csv");
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    (dir, path)
}

#[rstest]
fn loads_rows_and_commands() {
    let (_dir, path) = write_csv(&[
        "t_ms,switch_pwm,armed,altitude_m,throttle_pct,command",
        "0,1000,false,0.0,0,",
        "500,1800,true,0.0,0,",
        "9000,1800,true,0.0,40,gear:6",
        "12000,1800,true,0.0,40,start_height:5",
    ]);
    let rows = load_scenario_csv(&path).expect("load");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].switch_pwm, 1800);
    assert!(rows[1].armed);
    assert_eq!(rows[0].parsed_command().unwrap(), None);
    assert_eq!(
        rows[2].parsed_command().unwrap(),
        Some(ScenarioCommand::Gear(6))
    );
    assert_eq!(
        rows[3].parsed_command().unwrap(),
        Some(ScenarioCommand::StartAtHeight(5.0))
    );
}

#[rstest]
fn rejects_wrong_headers() {
    let (_dir, path) = write_csv(&["time,switch,armed", "0,1000,false"]);
    let err = load_scenario_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[rstest]
fn rejects_time_going_backwards() {
    let (_dir, path) = write_csv(&[
        "t_ms,switch_pwm,armed,altitude_m,throttle_pct,command",
        "1000,1800,true,0.0,0,",
        "500,1800,true,0.0,0,",
    ]);
    let err = load_scenario_csv(&path).expect_err("time order");
    assert!(format!("{err}").contains("non-decreasing"));
}

#[rstest]
fn rejects_unknown_command() {
    let (_dir, path) = write_csv(&[
        "t_ms,switch_pwm,armed,altitude_m,throttle_pct,command",
        "0,1800,true,0.0,0,choke",
    ]);
    let err = load_scenario_csv(&path).expect_err("unknown command");
    assert!(format!("{err}").contains("unknown scenario command"));
}

#[rstest]
fn rejects_empty_scenario() {
    let (_dir, path) = write_csv(&["t_ms,switch_pwm,armed,altitude_m,throttle_pct,command"]);
    assert!(load_scenario_csv(&path).is_err());
}
