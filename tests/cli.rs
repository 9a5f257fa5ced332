//! Command line behaviour: exit codes and output streams.

#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::*;
use predicates::prelude::*;

const CONFIG: &str = r#"
auxiliary_files = ["README.md"]

[package]
name = "WebShell"
version = "1.0.0"

[manifest]
"*.html" = "."
"icons/*.png" = "icons/"
"#;

fn packager(fx: &Fixture) -> Command {
    std::fs::write(fx.source().join("packaging.toml"), CONFIG).unwrap();
    let mut cmd = Command::cargo_bin("webshell_packager").unwrap();
    cmd.env_remove("WEBSHELL_PACKAGER_TOOL_PATH")
        .env_remove("RUST_LOG")
        .arg("--source")
        .arg(fx.source())
        .arg("--tool-path")
        .arg(fx.tools());
    cmd
}

#[test]
fn help_exits_zero() {
    Command::cargo_bin("webshell_packager")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("appimage"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    Command::cargo_bin("webshell_packager")
        .unwrap()
        .arg("dmg")
        .assert()
        .code(64);
}

#[test]
fn onefile_json_report_on_stdout() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAKE_PACKAGER);

    let output = packager(&fx).args(["onefile", "--json"]).assert().success();
    let report: serde_json::Value =
        serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(report["status"], "succeeded");
    assert_eq!(report["target"], "onefile");
    let artifact = &report["artifacts"][0];
    assert!(artifact["path"].as_str().unwrap().ends_with("/WebShell"));
    assert_eq!(artifact["checksum"].as_str().unwrap().len(), 64);
}

#[test]
fn output_dir_overrides_the_target_directory() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAKE_PACKAGER);
    let out = fx.root().join("release");

    packager(&fx)
        .arg("onefile")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("onefile succeeded"));
    assert!(out.join("WebShell").is_file());
}

#[test]
fn tool_failure_reports_stage_and_diagnostics() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAILING_PACKAGER);

    packager(&fx)
        .arg("portable")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("failed at stage `invoke:packager`"))
        .stderr(predicate::str::contains("pyinstaller"))
        .stderr(predicate::str::contains("ModuleNotFoundError"));
}

#[test]
fn json_mode_keeps_diagnostics_on_stderr() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAILING_PACKAGER);

    let output = packager(&fx)
        .args(["portable", "--json"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("failed at stage `invoke:packager`"))
        .stderr(predicate::str::contains("ModuleNotFoundError"));
    let report: serde_json::Value =
        serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(report["status"], "failed");
    assert_eq!(report["failure"]["kind"], "ToolInvocationFailed");
}

#[test]
fn check_names_the_missing_tool() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAKE_PACKAGER);

    packager(&fx)
        .args(["check", "installer"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("makensis"));

    packager(&fx).args(["check", "onefile"]).assert().success();
}

#[test]
fn clean_after_build() {
    let fx = Fixture::new();
    fx.tool("pyinstaller", FAKE_PACKAGER);
    packager(&fx).arg("onefile").assert().success();
    assert!(fx.source().join("dist/onefile/WebShell").is_file());

    packager(&fx).args(["clean", "onefile"]).assert().success();
    assert!(!fx.source().join("dist/onefile").exists());
    assert!(!fx.source().join("build/onefile").exists());
    assert!(fx.source().join("main.py").is_file());
}

#[test]
fn invalid_config_exits_with_config_code() {
    let fx = Fixture::new();
    let config = fx.root().join("broken.toml");
    std::fs::write(&config, "[package]\nnmae = \"x\"\n").unwrap();

    packager(&fx)
        .arg("onefile")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(9)
        .stderr(predicate::str::contains("broken.toml"));
}
