//! Command line smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_intune").unwrap();
    cmd.env_remove("KODEGEN_INTUNE_CONFIG")
        .env_remove("KODEGEN_INTUNE_TOKEN")
        .env_remove("KODEGEN_INTUNE_CLIENT_SECRET");
    cmd
}

#[test]
fn help_lists_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("test"));
}

#[test]
fn missing_subcommand_is_usage_error() {
    bin().assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn build_requires_existing_source() {
    let dir = tempfile::tempdir().unwrap();
    bin()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("build")
        .arg(dir.path().join("missing.msi"))
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Source installer not found"));
}

#[test]
fn setup_writes_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.toml");

    bin()
        .arg("--config")
        .arg(&config)
        .args(["setup", "--tenant-id", "tenant", "--client-id", "client"])
        .args(["--tool-path", "C:/Tools/IntuneWinAppUtil.exe"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("tenant_id = \"tenant\""));
    assert!(written.contains("client_id = \"client\""));
}

#[test]
fn build_without_tool_reports_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("setup.exe");
    std::fs::write(&source, b"MZ").unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "tool_path = '/definitely/not/here/IntuneWinAppUtil.exe'\n",
    )
    .unwrap();

    bin()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("build")
        .arg(&source)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--detection-rule")
        .arg("C:/Tool/tool.exe")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("packaging tool not found"));
}

#[test]
fn upload_without_package_fails_before_contacting_intune() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    std::fs::create_dir_all(output.join("staging")).unwrap();
    std::fs::write(output.join("staging").join("setup.exe"), b"MZ").unwrap();

    bin()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("upload")
        .arg(&output)
        .args(["--access-token", "token"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("package not found"));
}

#[test]
fn upload_with_empty_staging_asks_for_source() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    std::fs::create_dir_all(output.join("staging")).unwrap();

    bin()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("upload")
        .arg(&output)
        .args(["--access-token", "token"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pass --source"));
}
