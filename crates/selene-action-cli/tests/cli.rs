#![cfg(unix)]
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const WARNING: &str = r#"{"severity":"Warning","code":"unused_variable","message":"x is never used","primary_label":{"filename":"src/main.lua","span":{"start_line":4,"start_column":7}}}"#;
const ERROR: &str = r#"{"severity":"Error","code":"parse_error","message":"expected `end`","primary_label":{"filename":"src/broken.lua","span":{"start_line":10,"start_column":1}}}"#;

/// A workspace containing a `game` package and a pre-installed fake
/// selene that prints `stdout_lines` and exits with `code`.
fn workspace_with_selene(stdout_lines: &[&str], code: i32) -> TempDir {
    let ws = tempdir().unwrap();
    fs::create_dir_all(ws.path().join("game/src")).unwrap();

    let mut script = String::from("#!/bin/sh\n");
    for line in stdout_lines {
        script.push_str(&format!("echo '{line}'\n"));
    }
    script.push_str(&format!("exit {code}\n"));

    let bin = ws.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let selene = bin.join("selene");
    fs::write(&selene, script).unwrap();
    fs::set_permissions(&selene, fs::Permissions::from_mode(0o755)).unwrap();
    ws
}

/// Runs against the pre-installed binary with `latest`, so nothing is
/// downloaded.
fn action_cmd(ws: &Path) -> Command {
    let mut cmd = Command::cargo_bin("selene-action-cli").expect("binary should be built");
    cmd.env_remove("RUST_LOG")
        .arg("--github-workspace")
        .arg(ws)
        .arg("--install-dir")
        .arg(ws.join("bin"))
        .arg("--selene-version")
        .arg("latest")
        .arg("--working-directory")
        .arg("game")
        .arg("--lint-path")
        .arg("src");
    cmd
}

#[test]
fn warnings_pass_and_are_annotated() {
    let ws = workspace_with_selene(&[WARNING, "Results:", "0 errors", "1 warnings"], 1);

    action_cmd(ws.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains(WARNING))
        .stdout(predicate::str::contains("1 warnings\n"))
        .stdout(predicate::str::contains(
            "::warning file=game/src/main.lua,line=4,title=Selene Warning (unused_variable)::x is never used",
        ));
}

#[test]
fn fail_on_warnings_from_environment() {
    let ws = workspace_with_selene(&[WARNING], 1);

    action_cmd(ws.path())
        .env("INPUT_FAIL-ON-WARNINGS", "true")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fail-on-warnings enabled"));
}

#[test]
fn flag_overrides_environment() {
    let ws = workspace_with_selene(&[WARNING], 1);

    action_cmd(ws.path())
        .env("INPUT_FAIL-ON-WARNINGS", "true")
        .arg("--fail-on-warnings=false")
        .assert()
        .code(0);
}

#[test]
fn error_finding_fails_even_on_clean_exit() {
    let ws = workspace_with_selene(&[ERROR], 0);

    action_cmd(ws.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "::failure file=game/src/broken.lua,line=10,title=Selene Error (parse_error)::expected `end`",
        ))
        .stderr(predicate::str::contains("critical errors"));
}

#[test]
fn annotations_can_be_disabled() {
    let ws = workspace_with_selene(&[WARNING], 0);

    action_cmd(ws.path())
        .arg("--report-as-annotations")
        .arg("false")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(WARNING))
        .stdout(predicate::str::contains("::warning").not());
}

#[test]
fn malformed_output_is_echoed_and_tolerated() {
    let ws = workspace_with_selene(&["{not valid json}", "not-json-at-all"], 0);

    action_cmd(ws.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("{not valid json}\nnot-json-at-all\n"))
        .stderr(predicate::str::contains("failed to decode structured selene output"));
}

#[test]
fn abnormal_exit_fails() {
    let ws = workspace_with_selene(&[], 3);

    action_cmd(ws.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("abnormal analyzer termination"))
        .stderr(predicate::str::contains("code 3"));
}

#[test]
fn existing_binary_is_reused_for_latest() {
    let ws = workspace_with_selene(&[], 0);

    action_cmd(ws.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("using existing selene binary"));
}

#[test]
fn help_lists_inputs() {
    Command::cargo_bin("selene-action-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-on-warnings"))
        .stdout(predicate::str::contains("INPUT_SELENE-VERSION"));
}
