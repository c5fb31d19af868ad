use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;
use std::path::Path;
use tempfile::TempDir;

const FLAGGED_CSV: &str = "\
APPT_ID,PATIENT_MRN,APPT_TYPE,APPT_DTTM,SCHEDULER_ID
APT-20000001,4000001,Lab,2025-05-19 08:15:00,scheduler_A_diligent
APT-20000002,4000001,Chemo,2025-05-20 10:30:00,scheduler_A_diligent
APT-20000003,4000002,Chemo,2025-05-26 16:00:00,scheduler_C_forgetful
";

fn write_input(dir: &Path) -> String {
    let path = dir.join("appointments.csv");
    std::fs::write(&path, FLAGGED_CSV).unwrap();
    path.to_str().unwrap().to_string()
}

fn cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("scheduler-check");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn flagged_run_exits_zero_by_default() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["--input-file", &write_input(tmp.path()), "--now", "2025-05-01"])
        .assert()
        .code(0)
        .stdout(contains("--- Email Report for: scheduler_C_forgetful ---"))
        .stdout(contains(
            "Critical Error: A Chemo on 2025-05-26 has no Lab test scheduled within the prior 7 days.",
        ));
}

#[test]
fn flagged_run_with_fail_on_flags_exits_four() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["--input-file", &write_input(tmp.path()), "--now", "2025-05-01", "--fail-on-flags"])
        .assert()
        .code(4);
}

#[test]
fn clean_run_with_fail_on_flags_exits_zero() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args([
            "--input-file",
            &write_input(tmp.path()),
            "--now",
            "2025-05-19",
            "--lookahead-days",
            "3",
            "--fail-on-flags",
        ])
        .assert()
        .code(0)
        .stdout(contains("✅ No scheduling errors were found in the upcoming appointments."));
}

#[test]
fn missing_input_exits_one() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("generated_appointments_v5.csv");
    cmd()
        .args(["--input-file", missing.to_str().unwrap(), "--now", "2025-05-01"])
        .assert()
        .code(1)
        .stderr(contains("was not found"));
}

#[test]
fn far_future_now_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["--input-file", &write_input(tmp.path()), "--now", "+262142-12-01"])
        .assert()
        .code(1)
        .stderr(contains("Setting 'now' is invalid"))
        .stderr(contains("panicked").not());
}
