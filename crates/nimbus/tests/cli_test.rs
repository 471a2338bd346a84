#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! once assert_cmd 2.1 is the minimum

use assert_cmd::Command;
use predicates::prelude::*;

/// Command with mock credentials, isolated from any config in the checkout
fn nimbus() -> Command {
    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.current_dir(std::env::temp_dir())
        .env("NIMBUS_DRIVER", "mock")
        .env("NIMBUS_USER", "mockuser")
        .env("NIMBUS_PASSWORD", "mockpassword")
        .env_remove("NIMBUS_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("One front end, many clouds"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("create-instance"))
        .stdout(predicate::str::contains("states"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nimbus"));
}

#[test]
fn test_invalid_command() {
    nimbus().arg("invalid-command").assert().failure();
}

#[test]
fn test_unknown_collection() {
    nimbus()
        .args(["list", "buckets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("buckets"));
}

#[test]
fn test_drivers() {
    nimbus()
        .arg("drivers")
        .assert()
        .success()
        .stdout(predicate::str::contains("mock"));
}

#[test]
fn test_profiles_filter() {
    nimbus()
        .args(["profiles", "--filter", "architecture=i386"])
        .assert()
        .success()
        .stdout(predicate::str::contains("m1-small"))
        .stdout(predicate::str::contains("opaque"))
        .stdout(predicate::str::contains("m1-xlarge").not());
}

#[test]
fn test_features() {
    nimbus()
        .arg("features")
        .assert()
        .success()
        .stdout(predicate::str::contains("user_data"))
        .stdout(predicate::str::contains("max_length=50"));
}

#[test]
fn test_states() {
    nimbus()
        .args(["states", "instances"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopping"))
        .stdout(predicate::str::contains("reboot"));

    nimbus()
        .args(["states", "realms"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("501"));
}

#[test]
fn test_list_instances_json() {
    nimbus()
        .args(["--json", "list", "instances", "--filter", "state=running"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"inst0\""))
        .stdout(predicate::str::contains("\"inst1\"").not())
        .stdout(predicate::str::contains("\"stop\""));
}

#[test]
fn test_show_missing_instance() {
    nimbus()
        .args(["show", "instances", "inst42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));
}

#[test]
fn test_illegal_action() {
    nimbus()
        .args(["act", "instances", "inst1", "stop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("405"));

    nimbus()
        .args(["act", "instances", "inst0", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopping"));
}

#[test]
fn test_create_instance() {
    nimbus()
        .args([
            "--json",
            "create-instance",
            "--image",
            "img1",
            "--profile",
            "m1-large",
            "--set",
            "cpu=2",
            "--name",
            "web",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pending\""))
        .stdout(predicate::str::contains("\"m1-large\""));

    nimbus()
        .args([
            "create-instance",
            "--image",
            "img1",
            "--profile",
            "m1-large",
            "--set",
            "cpu=9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("400"));
}

#[test]
fn test_wrong_credentials() {
    nimbus()
        .env("NIMBUS_PASSWORD", "wrong")
        .args(["list", "realms"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("401"));
}

#[test]
fn test_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("nimbus.yaml"),
        "driver: mock\ncredentials:\n  user: mockuser\n  password: mockpassword\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.current_dir(temp_dir.path())
        .env_remove("NIMBUS_USER")
        .env_remove("NIMBUS_PASSWORD")
        .env_remove("NIMBUS_DRIVER")
        .env_remove("NIMBUS_CONFIG_PATH")
        .args(["list", "realms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("us"));

    std::fs::write(temp_dir.path().join("nimbus.yaml"), "driver: ec2\n").unwrap();
    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.current_dir(temp_dir.path())
        .env_remove("NIMBUS_DRIVER")
        .env_remove("NIMBUS_CONFIG_PATH")
        .args(["list", "realms"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown driver"));
}

#[test]
fn test_config_provider_sets_default_realm() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("nimbus.yaml"),
        "driver: mock\nprovider: eu\n",
    )
    .unwrap();

    nimbus()
        .current_dir(temp_dir.path())
        .args(["--json", "create-instance", "--image", "img1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"realm_id\": \"eu\""));
}
