use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tcdecode"))
}

fn repo_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn sample_capture(name: &str) -> PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join(name)
        .join("input.TC")
}

fn input_dir_with_broken_file() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    fs::copy(sample_capture("basic"), temp.path().join("a_basic.TC")).expect("copy");
    fs::write(
        temp.path().join("b_broken.TC"),
        [
            0x00, 0x00, 0x10, 0x00, 0x02, 0x00, 0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ],
    )
    .expect("write broken capture");
    fs::copy(sample_capture("no_variables"), temp.path().join("c_empty.TC")).expect("copy");
    temp
}

#[test]
fn help_lists_subcommands() {
    for sub in ["decode", "inspect", "summary"] {
        cmd().arg(sub).arg("--help").assert().success();
    }
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("inspect")));
}

#[test]
fn decode_single_file_writes_csv() {
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(sample_capture("basic"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stderr(contains("OK:"));

    let csv = fs::read_to_string(out.path().join("input.csv")).expect("read csv");
    let expected = fs::read_to_string(repo_root().join("tests/golden/basic/expected.csv"))
        .expect("read expected");
    assert_eq!(csv, expected.replace("\r\n", "\n"));
}

#[test]
fn decode_directory_continues_past_failures() {
    let input = input_dir_with_broken_file();
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(
            contains("b_broken.TC")
                .and(contains("1 of 3 capture files failed"))
                .and(contains("hint:")),
        );

    assert!(out.path().join("a_basic.csv").exists());
    assert!(out.path().join("c_empty.csv").exists());
    assert!(!out.path().join("b_broken.csv").exists());
}

#[test]
fn fail_fast_stops_after_first_failure() {
    let input = input_dir_with_broken_file();
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("--fail-fast")
        .assert()
        .failure()
        .stderr(contains("drop --fail-fast"));

    assert!(out.path().join("a_basic.csv").exists());
    assert!(!out.path().join("c_empty.csv").exists());
}

#[test]
fn report_lists_every_file() {
    let input = input_dir_with_broken_file();
    let out = TempDir::new().expect("tempdir");
    let report = out.path().join("report.json");
    cmd()
        .arg("decode")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("--report")
        .arg(&report)
        .assert()
        .failure();

    let json: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report")).expect("json");
    let files = json["files"].as_array().expect("files array");
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["status"], "exported");
    assert_eq!(files[0]["rows"], 3);
    assert_eq!(files[1]["status"], "failed");
}

#[test]
fn quiet_suppresses_ok_message() {
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(sample_capture("basic"))
        .arg("-o")
        .arg(out.path())
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn strict_trailing_rejects_fixture_tail() {
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(sample_capture("basic"))
        .arg("-o")
        .arg(out.path())
        .arg("--strict-trailing")
        .assert()
        .failure()
        .stderr(contains("truncated record"));
}

#[test]
fn empty_directory_shows_error_and_hint() {
    let input = TempDir::new().expect("tempdir");
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(contains("no capture files found").and(contains("hint:")));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(temp.path().join("missing.TC"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn glob_pattern_selects_captures() {
    let input = input_dir_with_broken_file();
    let out = TempDir::new().expect("tempdir");
    let pattern = format!("{}/a_*.TC", input.path().display());
    cmd()
        .arg("decode")
        .arg(pattern)
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();
    assert!(out.path().join("a_basic.csv").exists());
}

#[test]
fn invalid_delimiter_is_rejected() {
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(sample_capture("basic"))
        .arg("-o")
        .arg(out.path())
        .arg("--delimiter")
        .arg("é")
        .assert()
        .failure()
        .stderr(contains("unsupported delimiter"));
}

#[test]
fn inspect_prints_layout_json() {
    let assert = cmd()
        .arg("inspect")
        .arg(sample_capture("basic"))
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["capture"]["labels"][0], "Temp (degC)");
    assert_eq!(json["discarded_trailing_bytes"], 3);
    assert_eq!(json["sections"][2]["header"]["declared"], 8);
}

#[test]
fn summary_prints_column_statistics() {
    let out = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg(sample_capture("basic"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    let assert = cmd()
        .arg("summary")
        .arg(out.path().join("input.csv"))
        .arg("--from")
        .arg("0")
        .arg("--to")
        .arg("1")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["rows_selected"], 2);
    assert_eq!(json["columns"][0]["name"], "Temp (degC)");
    assert_eq!(json["columns"][0]["max"], 22.0);
    assert_eq!(json["columns"][1]["count"], 1);
}

#[test]
fn summary_rejects_reversed_range() {
    let out = TempDir::new().expect("tempdir");
    let csv = out.path().join("x.csv");
    fs::write(&csv, "Measurement #,a\n1,2\n").expect("write csv");
    cmd()
        .arg("summary")
        .arg(&csv)
        .arg("--from")
        .arg("3")
        .arg("--to")
        .arg("1")
        .assert()
        .failure()
        .stderr(contains("invalid row range"));
}
