//! CLI integration tests for mongo-migrate.
//!
//! These tests verify command-line argument parsing, help output, and exit
//! codes for conditions that do not require a running database.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the mongo-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("mongo-migrate").unwrap()
}

/// Write a config file pointing at a never-contacted local database.
fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let yaml = format!(
        "database:\n  uri: mongodb://127.0.0.1:27017\n  name: monitoring\nstorage:\n  migrations_root: {root}/migrations\n  dumps_root: {root}/dumps\n",
        root = dir.path().display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("list-migrations"));
}

#[test]
fn test_migrate_subcommand_help() {
    cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--all"))
        .stdout(predicate::str::contains("COLLECTION[:REFERENCE]"));
}

#[test]
fn test_rollback_subcommand_help() {
    cmd()
        .args(["rollback", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--all"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongo-migrate"));
}

// =============================================================================
// Argument Validation Tests
// =============================================================================

#[test]
fn test_migrate_requires_collections() {
    cmd()
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COLLECTION"));
}

#[test]
fn test_rollback_requires_collections() {
    cmd().arg("rollback").assert().failure();
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_failure() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "migrate", "users"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_unregistered_collection_batch_is_a_clean_noop() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // "sessions" is not a registered collection: the request is partitioned
    // out, nothing connects, and the batch exits cleanly.
    cmd()
        .args(["--config", config.to_str().unwrap(), "migrate", "sessions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No migrations found"));
}

#[test]
fn test_list_migrations_without_migration_scripts() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    cmd()
        .args(["--config", config.to_str().unwrap(), "list-migrations"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No migration scripts found"));
}
