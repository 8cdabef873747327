use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use tempfile::tempdir;

fn write_config(dir: &Path, format_if_missing: bool, cycle_delay_ms: u64) -> PathBuf {
    let store = dir.join("eeprom.bin");
    let toml = format!(
        r#"
[sensors]
count = 12
max_height_mm = 153

[timing]
cycle_delay_ms = {cycle_delay_ms}
poll_interval_ms = 1

[storage]
path = {store:?}
format_if_missing = {format_if_missing}

[simulation]
dry_counts = 1000
wet_counts = 1200
"#
    );
    let path = dir.join("levelmon.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn levelmon(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("levelmon").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--cycles", "abc"], 2, "invalid value", "stderr")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let out = Command::cargo_bin("levelmon").unwrap().args(args).output().unwrap();
    assert_eq!(out.status.code(), Some(exit_code));
    let text = if stream == "stdout" {
        String::from_utf8_lossy(&out.stdout).to_string()
    } else {
        String::from_utf8_lossy(&out.stderr).to_string()
    };
    assert!(text.contains(needle), "missing {needle:?} in {text}");
}

#[test]
fn run_prints_banner_then_one_line_per_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    let out = levelmon(&cfg)
        .args(["run", "--cycles", "3"])
        .write_stdin("")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Capacitive Liquid Level Monitor"));
    assert!(out.contains("EmptyCal=0,0,0,0,0,0,0,0,0,0,0,0,\r\n"));
    // blank store: zero baselines put every dry slot above its threshold
    assert_eq!(out.matches("%=100.0   mm=153.0\r\n").count(), 3);
}

#[test]
fn csv_mode_sends_header_once() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    let out = levelmon(&cfg)
        .args(["run", "--cycles", "4", "--mode", "csv"])
        .write_stdin("")
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert_eq!(text.matches("Raw0,Diff0,Proc0,").count(), 1);
    assert!(!text.contains("%="));
}

#[test]
fn cal_over_stdin_persists_baselines() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 20);
    levelmon(&cfg)
        .args(["run", "--cycles", "15"])
        .write_stdin("cal\r")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "EmptyCal=1000,1000,1000,1000,1000,1000,1000,1000,1000,1000,1000,1000,\r\n",
        ));

    let out = levelmon(&cfg)
        .args(["--json", "show-cal"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["baselines"], serde_json::json!(vec![1000; 12]));

    levelmon(&cfg)
        .args(["run", "--cycles", "2"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("%=0.0   mm=0.0\r\n"));
    levelmon(&cfg)
        .args(["run", "--cycles", "2", "--fill-mm", "153"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("%=100.0   mm=153.0\r\n"));
}

#[test]
fn missing_store_without_format_exits_3() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false, 0);
    levelmon(&cfg)
        .args(["run", "--cycles", "1"])
        .write_stdin("")
        .assert()
        .code(3)
        .stdout(predicate::str::contains(
            "Emulated EEPROM Initialization Error \r\n",
        ))
        .stderr(predicate::str::contains("could not be initialized"));
    assert!(!dir.path().join("eeprom.bin").exists());
}

#[test]
fn show_cal_json_error_on_missing_store() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    let out = levelmon(&cfg).args(["--json", "show-cal"]).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    let v: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(v["reason"], "StoreInit");
    assert_eq!(v["exit_code"], 3);
}

#[test]
fn self_check_reports_ok_after_first_run() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    levelmon(&cfg)
        .args(["run", "--cycles", "1"])
        .write_stdin("")
        .assert()
        .success();
    let out = levelmon(&cfg)
        .args(["--json", "self-check"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["sensors"], 12);
    assert_eq!(v["reading"], "%=100.0   mm=153.0");
}

#[test]
fn bad_sensor_table_headers_are_explained() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    let table = dir.path().join("table.csv");
    fs::write(&table, "index,gain,cutoff\n0,256,142\n1,256,142\n").unwrap();
    levelmon(&cfg)
        .arg("--sensor-table")
        .arg(&table)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid headers in sensor table CSV",
        ));
}

#[test]
fn sensor_table_sets_slot_count() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true, 0);
    let table = dir.path().join("table.csv");
    fs::write(
        &table,
        "slot,scale,threshold\n0,464,142\n1,256,142\n2,256,142\n3,448,142\n",
    )
    .unwrap();
    levelmon(&cfg)
        .arg("--sensor-table")
        .arg(&table)
        .args(["run", "--cycles", "1"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("EmptyCal=0,0,0,0,\r\n"));
}
