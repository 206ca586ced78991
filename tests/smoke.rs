//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Network link reporting and active HTTP speed probing",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("netgauge"));
}

#[test]
fn test_net_type_subcommand_exists() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .arg("net-type")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn test_snapshot_subcommand_exists() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .arg("snapshot")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn test_download_subcommand_exists() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .args(["download", "--help"])
        .assert()
        .success();
}

#[test]
fn test_upload_subcommand_exists() {
    Command::cargo_bin("netgauge")
        .unwrap()
        .args(["upload", "--help"])
        .assert()
        .success();
}

#[test]
fn test_net_type_prints_a_bucket() {
    // Always answers with one of the three buckets, whatever the host looks
    // like.
    Command::cargo_bin("netgauge")
        .unwrap()
        .arg("net-type")
        .assert()
        .success()
        .stdout(
            predicates::str::contains("wifi")
                .or(predicates::str::contains("mobile"))
                .or(predicates::str::contains("unknown")),
        );
}
