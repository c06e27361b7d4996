// End-to-end tests for the freightline binary against a temporary ledger

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn freightline(ledger: &Path) -> Command {
    let mut cmd = Command::cargo_bin("freightline").unwrap();
    cmd.arg("--ledger").arg(ledger).env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_no_subcommand_shows_getting_started() {
    let dir = TempDir::new().unwrap();
    freightline(&dir.path().join("ledger.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("freightline statuses"))
        .stdout(predicate::str::contains("freightline scan --to IN_WAREHOUSE"));
}

#[test]
fn test_statuses_lists_canonical_order() {
    let dir = TempDir::new().unwrap();
    freightline(&dir.path().join("ledger.json"))
        .arg("statuses")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRANSFERRING_FORWARDER"))
        .stdout(predicate::str::contains("(terminal)"))
        .stdout(predicate::str::contains("FORWARDER_TRANSFER"));
}

#[test]
fn test_check_rejects_skipping_to_delivered() {
    let dir = TempDir::new().unwrap();
    freightline(&dir.path().join("ledger.json"))
        .args(["check", "IN_WAREHOUSE", "DELIVERED"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid transition from IN_WAREHOUSE to DELIVERED"));
}

#[test]
fn test_check_accepts_failed_attempt_case_insensitively() {
    let dir = TempDir::new().unwrap();
    freightline(&dir.path().join("ledger.json"))
        .args(["check", "out-for-delivery", "in_warehouse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("failed attempt"));
}

#[test]
fn test_package_lifecycle_through_the_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");

    freightline(&ledger)
        .args(["package", "create", "PH-0001", "--mode", "sea"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered PH-0001 (PENDING)"));

    freightline(&ledger)
        .args(["package", "advance", "PH-0001", "PREPARED_BY_AGENT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PH-0001 is now PREPARED_BY_AGENT"));

    freightline(&ledger)
        .args(["package", "advance", "PH-0001", "DELIVERED"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid transition"));

    let output = freightline(&ledger)
        .args(["--json", "package", "history", "PH-0001"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "PREPARED_BY_AGENT");
}

#[test]
fn test_role_is_enforced() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");

    freightline(&ledger)
        .args(["package", "create", "PH-0002"])
        .assert()
        .success();

    freightline(&ledger)
        .args(["--role", "driver", "package", "advance", "PH-0002", "PREPARED_BY_AGENT"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("may not record"));
}

#[test]
fn test_scan_reports_rejections_without_failing() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");

    for id in ["PH-1", "PH-2"] {
        freightline(&ledger)
            .args(["package", "create", id])
            .assert()
            .success();
    }

    freightline(&ledger)
        .args(["scan", "--to", "PREPARED_BY_AGENT", "PH-1", "PH-2", "PH-404"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 accepted, 1 rejected"))
        .stdout(predicate::str::contains("PH-404 - Unknown tracking number"));
}

#[test]
fn test_shipment_waits_for_its_packages() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");

    freightline(&ledger)
        .args(["package", "create", "PH-1"])
        .assert()
        .success();

    let output = freightline(&ledger)
        .args(["--json", "shipment", "create", "--kind", "incoming", "PH-1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shipment: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = shipment["id"].as_str().unwrap().to_string();

    freightline(&ledger)
        .args(["shipment", "advance", &id, "IN_TRANSIT"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not yet at SHIPPED_BY_AGENT"));

    for status in ["PREPARED_BY_AGENT", "SHIPPED_BY_AGENT"] {
        freightline(&ledger)
            .args(["package", "advance", "PH-1", status])
            .assert()
            .success();
    }

    freightline(&ledger)
        .args(["shipment", "advance", &id, "IN_TRANSIT"])
        .assert()
        .success();
    freightline(&ledger)
        .args(["shipment", "advance", &id, "ARRIVED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PH-1 SHIPPED_BY_AGENT -> ARRIVED_IN_PH"));
}

#[test]
fn test_archived_package_keeps_history_but_not_moving() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");

    freightline(&ledger)
        .args(["package", "create", "PH-3"])
        .assert()
        .success();
    freightline(&ledger)
        .args(["package", "archive", "PH-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived PH-3 at PENDING"));

    freightline(&ledger)
        .args(["package", "advance", "PH-3", "PREPARED_BY_AGENT"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PH-3 is archived"));
    freightline(&ledger)
        .args(["package", "history", "PH-3"])
        .assert()
        .success();
}
