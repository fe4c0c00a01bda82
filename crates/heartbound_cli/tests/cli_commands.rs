use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const STORY_LINES: usize = 999;

fn minimal_save() -> String {
    let mut text = String::from("1234567890\nstart_room\n100\n200\n100\n100\n0\n");
    for _ in 0..STORY_LINES {
        text.push_str("0\n");
    }
    text
}

fn write_save(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("heartbound_save8.thor");
    fs::write(&path, minimal_save()).expect("failed to write save fixture");
    path
}

fn run_cli(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heartbound-se"))
        .arg("--config-dir")
        .arg(config_dir)
        .args(args)
        .env_remove("HEARTBOUND_LIB_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run heartbound-se CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn show_json_reports_player() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let save = save.to_string_lossy().to_string();

    let output = run_cli(temp.path(), &["show", &save, "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(value["seed"], "1234567890");
    assert_eq!(value["room_id"], "start_room");
    assert_eq!(value["room_known"], true);
    assert_eq!(value["hp_max"], 100);
}

#[test]
fn show_remembers_last_save_path() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let save_arg = save.to_string_lossy().to_string();

    assert!(run_cli(temp.path(), &["show", &save_arg]).status.success());
    let cfg = fs::read_to_string(temp.path().join("editor.cfg")).expect("settings written");
    assert!(cfg.contains(&format!("last_save_path={save_arg}")));

    let output = run_cli(temp.path(), &["show", "--json"]);
    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(value["seed"], "1234567890");
}

#[test]
fn validate_accepts_good_and_rejects_bad() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let good = save.to_string_lossy().to_string();
    let output = run_cli(temp.path(), &["validate", &good]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("ok: "));

    let bad = temp.path().join("bad.thor");
    fs::write(&bad, minimal_save().replacen("start_room", "start room", 1)).expect("write");
    let output = run_cli(temp.path(), &["validate", &bad.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("invalid: "));
}

#[test]
fn edit_writes_modified_copy() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let out = temp.path().join("edited.thor");
    let output = run_cli(
        temp.path(),
        &[
            "edit",
            &save.to_string_lossy(),
            "--output",
            &out.to_string_lossy(),
            "--set-var",
            "2=3",
            "--room",
            "hometown_house",
            "--hp",
            "50/120",
            "--glyphs",
            "2",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(&out).expect("edited save");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], "hometown_house");
    assert_eq!(&lines[2..7], &["512 ", "384 ", "50 ", "120 ", "2 "]);
    assert_eq!(lines[8], "3 ");
    assert_eq!(fs::read_to_string(&save).expect("source"), minimal_save());
}

#[test]
fn edit_reloads_output_unless_disabled() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let save_arg = save.to_string_lossy().to_string();
    let out = temp.path().join("edited.thor");
    let out_arg = out.to_string_lossy().to_string();
    let edit = ["edit", &save_arg, "--output", &out_arg, "--seed", "42"];

    assert!(run_cli(temp.path(), &edit).status.success());
    let output = run_cli(temp.path(), &["show", "--json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(value["seed"], "42");

    assert!(
        run_cli(temp.path(), &["settings", "set", "automatic_reloading", "false"])
            .status
            .success()
    );
    assert!(run_cli(temp.path(), &edit).status.success());
    let output = run_cli(temp.path(), &["show", "--json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(value["seed"], "1234567890");
}

#[test]
fn edit_rejects_fractional_values() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let out = temp.path().join("edited.thor");
    let output = run_cli(
        temp.path(),
        &[
            "edit",
            &save.to_string_lossy(),
            "--output",
            &out.to_string_lossy(),
            "--set-var",
            "1=0.5",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn edit_rejects_out_of_range_variable() {
    let temp = TempDir::new().expect("temp dir");
    let save = write_save(&temp);
    let out = temp.path().join("edited.thor");
    let output = run_cli(
        temp.path(),
        &[
            "edit",
            &save.to_string_lossy(),
            "--output",
            &out.to_string_lossy(),
            "--set-var",
            "1=9",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("storyline variable"));
    assert!(!out.exists());
}

#[test]
fn room_and_location_lookups() {
    let temp = TempDir::new().expect("temp dir");
    let output = run_cli(temp.path(), &["room", "start_room"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "0\tstart_room\t100\t200");

    let output = run_cli(temp.path(), &["location", "Lore", "--json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(value["chapter"], "Global");

    let output = run_cli(temp.path(), &["room", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn broken_lib_dir_aborts_with_message() {
    let temp = TempDir::new().expect("temp dir");
    let empty = temp.path().join("lib");
    fs::create_dir_all(&empty).expect("mkdir");
    let output = run_cli(
        temp.path(),
        &["--lib-dir", &empty.to_string_lossy(), "room", "start_room"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).starts_with("Heartbound Save Editor - Error: ")
    );
}

#[test]
fn settings_round_trip_through_file() {
    let temp = TempDir::new().expect("temp dir");
    assert!(run_cli(temp.path(), &["settings", "set", "theme", "dark"]).status.success());

    let output = run_cli(temp.path(), &["settings", "get", "missing_key", "--default", "fallback"]);
    assert_eq!(stdout(&output).trim(), "fallback");
    let output = run_cli(temp.path(), &["settings", "get", "missing_key", "--default", "other"]);
    assert_eq!(stdout(&output).trim(), "fallback");

    let output = run_cli(temp.path(), &["settings", "list"]);
    assert_eq!(stdout(&output), "theme=dark\nmissing_key=fallback\n");

    assert!(run_cli(temp.path(), &["settings", "remove", "theme"]).status.success());
    let output = run_cli(temp.path(), &["settings", "get", "theme"]);
    assert_eq!(output.status.code(), Some(1));
}
