use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn cartographer_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cartographer"));
    cmd.arg("--root").arg(root).env_remove("RUST_LOG");
    cmd
}

fn write_app(root: &Path, name: &str, yaml: &str) {
    let apps = root.join("apps");
    fs::create_dir_all(&apps).expect("apps dir");
    fs::write(apps.join(format!("{name}.yaml")), yaml).expect("write app");
}

const VALID: &str = r#"
sources:
  - name: platform
    github: acme/platform
    path: shared
    files: [config.yaml]
destinations:
  - name: billing
    github: acme/billing
routes:
  - sources: [platform]
    destination: billing
"#;

#[test]
fn check_accepts_valid_apps() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "billing", VALID);

    cartographer_cmd(root.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("billing"))
        .stdout(contains("1 pairings"));
}

#[test]
fn check_fails_on_unresolvable_route() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "billing", VALID);
    write_app(
        root.path(),
        "broken",
        r#"
sources:
  - { name: platform, github: acme/platform, files: [a.txt] }
routes:
  - { sources: [platform], destination: nowhere }
"#,
    );

    cartographer_cmd(root.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(contains("broken"))
        .stdout(contains("nowhere"))
        .stderr(contains("1 of 2 app file(s) invalid"));
}

#[test]
fn check_fails_on_malformed_locator() {
    let root = TempDir::new().expect("root");
    write_app(
        root.path(),
        "typo",
        "sources:\n  - { name: s, github: not-a-locator, files: [a] }\n",
    );

    cartographer_cmd(root.path())
        .args(["check", "--quiet"])
        .assert()
        .failure()
        .stdout(contains("typo"));
}

#[test]
fn check_rejects_source_files_outside_the_repository() {
    let root = TempDir::new().expect("root");
    write_app(
        root.path(),
        "leaky",
        "sources:\n  - { name: s, github: acme/s, files: [../secret/token] }\n",
    );

    cartographer_cmd(root.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(contains("../secret/token"));
}

#[test]
fn check_reports_missing_apps_dir() {
    let root = TempDir::new().expect("root");

    cartographer_cmd(root.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("cannot read apps directory"));
}

#[test]
fn once_without_token_fails_at_startup() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "billing", VALID);

    cartographer_cmd(root.path())
        .arg("once")
        .assert()
        .failure()
        .stderr(contains("token"));
}

#[test]
fn once_with_blank_token_fails_at_startup() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "billing", VALID);
    fs::create_dir_all(root.path().join("secret")).expect("secret dir");
    fs::write(root.path().join("secret/token"), "\n").expect("token");

    cartographer_cmd(root.path())
        .arg("once")
        .assert()
        .failure()
        .stderr(contains("empty"));
}

#[test]
fn plan_with_no_apps_prints_nothing_to_do() {
    let root = TempDir::new().expect("root");
    fs::create_dir_all(root.path().join("apps")).expect("apps dir");

    cartographer_cmd(root.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("No apps found."));
}

#[test]
fn plan_for_unknown_app_fails() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "billing", VALID);

    cartographer_cmd(root.path())
        .args(["plan", "--app", "ghost"])
        .assert()
        .failure()
        .stderr(contains("no app named 'ghost'"));
}

#[test]
fn plan_logs_app_failures_to_stderr() {
    let root = TempDir::new().expect("root");
    write_app(root.path(), "broken", "sources: [unclosed\n");

    cartographer_cmd(root.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("broken"))
        .stderr(contains("app 'broken' could not be planned"));
}
