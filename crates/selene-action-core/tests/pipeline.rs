#![cfg(unix)]

use std::cell::Cell;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use selene_action_core::config::{ActionConfig, ActionInputs};
use selene_action_core::install::release::{Release, ReleaseAsset};
use selene_action_core::install::{ReleaseClient, ResolveError};
use selene_action_core::lint;
use selene_action_core::report::Level;
use tempfile::{TempDir, tempdir};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Serves one release whose Linux asset contains `script` as the analyzer.
struct ScriptRelease {
    archive: Vec<u8>,
    calls: Cell<usize>,
}

impl ScriptRelease {
    fn new(script: &str) -> Self {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("selene", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(script.as_bytes()).unwrap();
        Self {
            archive: writer.finish().unwrap().into_inner(),
            calls: Cell::new(0),
        }
    }
}

impl ReleaseClient for &ScriptRelease {
    fn fetch_release(&self, _url: &str) -> Result<Release, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        Ok(Release {
            tag_name: Some("0.27.1".into()),
            assets: vec![ReleaseAsset {
                name: "selene-0.27.1-linux.zip".into(),
                browser_download_url: "https://dl.test/selene-0.27.1-linux.zip".into(),
            }],
        })
    }

    fn download(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        sink.write_all(&self.archive).unwrap();
        Ok(self.archive.len() as u64)
    }
}

/// Lists a release but fails every download.
struct BrokenDownloads;

impl ReleaseClient for BrokenDownloads {
    fn fetch_release(&self, _url: &str) -> Result<Release, ResolveError> {
        Ok(Release {
            tag_name: Some("0.27.1".into()),
            assets: vec![ReleaseAsset {
                name: "selene-0.27.1-linux.zip".into(),
                browser_download_url: "https://dl.test/selene-0.27.1-linux.zip".into(),
            }],
        })
    }

    fn download(&self, url: &str, _sink: &mut dyn Write) -> Result<u64, ResolveError> {
        Err(ResolveError::network(url, "status 502 Bad Gateway, body: "))
    }
}

/// A workspace with a `game` package and an empty install directory.
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("game/src")).unwrap();
    dir
}

fn config(ws: &Path, fail_on_warnings: bool) -> ActionConfig {
    ActionConfig::from_inputs(ActionInputs {
        workspace_root: ws.to_path_buf(),
        working_directory: "game".into(),
        lint_path: "src".into(),
        fail_on_warnings,
        install_dir: ws.join(".bin"),
        ..Default::default()
    })
}

/// A fake analyzer printing one finding of `severity` and exiting `code`.
fn analyzer(severity: &str, code: i32) -> String {
    format!(
        r#"#!/bin/sh
echo '{{"severity":"{severity}","code":"unused_variable","message":"x is never used","primary_label":{{"filename":"src/main.lua","span":{{"start_line":4,"start_column":7}}}}}}'
echo 'Results:'
exit {code}
"#
    )
}

#[test]
fn warnings_pass_unless_fail_on_warnings() {
    let ws = workspace();
    let release = ScriptRelease::new(&analyzer("Warning", 1));

    let mut echo = Vec::new();
    let outcome = lint(&config(ws.path(), false), &release, &mut echo).expect("resolution succeeds");

    assert!(!outcome.binary.already_present);
    assert!(outcome.verdict.succeeded, "{:?}", outcome.verdict);
    assert_eq!(outcome.annotations.len(), 1);
    assert_eq!(outcome.annotations[0].file, "game/src/main.lua");
    assert_eq!(outcome.annotations[0].line, 4);
    assert_eq!(outcome.annotations[0].level, Level::Warning);
    assert!(String::from_utf8(echo).unwrap().contains("Results:\n"));

    let strict = lint(&config(ws.path(), true), &release, &mut std::io::sink()).unwrap();
    assert!(!strict.verdict.succeeded);
    assert!(strict.verdict.reason.contains("exit code 1"));
}

#[test]
fn latest_binary_is_reused_on_second_run() {
    let ws = workspace();
    let release = ScriptRelease::new(&analyzer("Warning", 0));

    let first = lint(&config(ws.path(), false), &release, &mut std::io::sink()).unwrap();
    let calls_after_first = release.calls.get();
    let second = lint(&config(ws.path(), false), &release, &mut std::io::sink()).unwrap();

    assert!(!first.binary.already_present);
    assert!(second.binary.already_present);
    assert_eq!(first.binary.sha256, second.binary.sha256);
    assert_eq!(release.calls.get(), calls_after_first);
}

#[test]
fn error_finding_fails_despite_clean_exit() {
    let ws = workspace();
    let release = ScriptRelease::new(&analyzer("Error", 0));

    let outcome = lint(&config(ws.path(), false), &release, &mut std::io::sink()).unwrap();

    assert_eq!(outcome.output.result.exit_code, Some(0));
    assert_eq!(outcome.annotations[0].level, Level::Failure);
    assert!(!outcome.verdict.succeeded);
    assert!(outcome.verdict.reason.contains("critical errors"));
}

#[test]
fn arguments_reach_the_analyzer() {
    let ws = workspace();
    let release = ScriptRelease::new("#!/bin/sh\nfor a in \"$@\"; do echo \"$a\"; done\n");
    let mut cfg = config(ws.path(), false);
    cfg.config_path = Some(ws.path().join("selene.toml"));

    let outcome = lint(&cfg, &release, &mut std::io::sink()).unwrap();

    let args: Vec<&str> = outcome.output.lines.iter().map(|l| l.text.as_str()).collect();
    let expected_config = ws.path().join("selene.toml").display().to_string();
    assert_eq!(
        args,
        ["--config", expected_config.as_str(), "--display-style", "Json", "src"]
    );
    assert!(outcome.verdict.succeeded);
}

#[test]
fn crashing_analyzer_is_abnormal() {
    let ws = workspace();
    let release = ScriptRelease::new("#!/bin/sh\necho 'thread main panicked' >&2\nexit 101\n");

    let outcome = lint(&config(ws.path(), false), &release, &mut std::io::sink()).unwrap();

    assert!(!outcome.verdict.succeeded);
    assert_eq!(outcome.verdict.rule, 6);
    assert!(outcome.verdict.reason.contains("101"));
    assert!(outcome.output.stderr.contains("panicked"));
}

#[test]
fn network_failure_aborts_before_any_run() {
    let ws = workspace();
    let mut echo = Vec::new();

    let err = lint(&config(ws.path(), false), BrokenDownloads, &mut echo).unwrap_err();

    assert!(matches!(err, ResolveError::Network { .. }), "{err:?}");
    assert!(!ws.path().join(".bin/selene").exists());
    assert!(echo.is_empty(), "nothing was echoed because nothing ran");
}

#[test]
fn timeout_ends_run_even_when_analyzer_forks() {
    let ws = workspace();
    let release = ScriptRelease::new("#!/bin/sh\necho started\nsleep 5\n");
    let mut cfg = config(ws.path(), false);
    cfg.timeout = Some(Duration::from_millis(500));

    let started = Instant::now();
    let outcome = lint(&cfg, &release, &mut std::io::sink()).unwrap();

    assert!(started.elapsed() < Duration::from_secs(4), "{:?}", started.elapsed());
    assert!(!outcome.verdict.succeeded);
    assert_eq!(outcome.verdict.rule, 6);
}
