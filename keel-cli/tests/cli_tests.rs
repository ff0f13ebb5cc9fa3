//! Integration tests for the Keel CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA_V1: &str = r#"
[[tables]]
name = "Person"
table_name = "person"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "name"
type = "char"
max_length = 100
"#;

const SCHEMA_V2: &str = r#"
[[tables]]
name = "Person"
table_name = "person"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "name"
type = "char"
max_length = 100

[[tables.fields]]
name = "email"
type = "char"
max_length = 255
null = true
unique = true
"#;

/// Get the keel binary, running in `dir`
#[allow(deprecated)]
fn keel_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.current_dir(dir)
        .env_remove("KEEL_DATABASE_URL")
        .env_remove("KEEL_CONFIG")
        .env_remove("KEEL_LOG_LEVEL");
    cmd
}

fn keel_db(dir: &Path) -> Command {
    let mut cmd = keel_cmd(dir);
    cmd.args(["--database", "sqlite://app.db"]);
    cmd
}

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    keel_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Keel"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn test_create_help() {
    let dir = TempDir::new().unwrap();
    keel_cmd(dir.path())
        .args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--auto"));
}

#[test]
fn test_database_is_required() {
    let dir = TempDir::new().unwrap();
    keel_cmd(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database is undefined"));
}

#[test]
fn test_unsupported_database_scheme() {
    let dir = TempDir::new().unwrap();
    keel_cmd(dir.path())
        .args(["--database", "postgres://localhost/app", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported database scheme"));
}

#[test]
fn test_create_empty_migration() {
    let dir = TempDir::new().unwrap();
    keel_db(dir.path())
        .args(["create", "manual"])
        .assert()
        .success()
        .stdout(predicate::str::contains("001_manual"));
    assert!(dir.path().join("migrations/001_manual.toml").exists());
}

#[test]
fn test_auto_migrate_list_rollback() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.toml"), SCHEMA_V1).unwrap();

    keel_db(dir.path())
        .args(["create", "initial", "--auto", "schema.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("001_initial"));

    keel_db(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 0, Pending: 1"));

    keel_db(dir.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("001_initial"))
        .stdout(predicate::str::contains("Applied 1 migrations"));

    keel_db(dir.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("There is nothing to migrate"));

    keel_db(dir.path())
        .args(["create", "again", "--auto", "schema.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes found."));
    assert!(!dir.path().join("migrations/002_again.toml").exists());

    keel_db(dir.path())
        .arg("rollback")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled back 1 migrations"));

    keel_db(dir.path())
        .arg("rollback")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to rollback 1 migrations from 0"));
}

#[test]
fn test_fake_migrate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.toml"), SCHEMA_V1).unwrap();

    keel_db(dir.path())
        .args(["create", "initial", "--auto", "schema.toml"])
        .assert()
        .success();
    keel_db(dir.path())
        .args(["migrate", "--fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded 1 migrations as applied"));
    keel_db(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 1, Pending: 0"));
}

#[test]
fn test_merge() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("v1.toml"), SCHEMA_V1).unwrap();
    fs::write(dir.path().join("v2.toml"), SCHEMA_V2).unwrap();

    keel_db(dir.path())
        .args(["create", "initial", "--auto", "v1.toml"])
        .assert()
        .success();
    keel_db(dir.path())
        .args(["create", "add_email", "--auto", "v2.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("002_add_email"));
    keel_db(dir.path()).arg("migrate").assert().success();

    keel_db(dir.path())
        .arg("merge")
        .assert()
        .success()
        .stdout(predicate::str::contains("001_initial"));

    assert!(dir.path().join("migrations/001_initial.toml").exists());
    assert!(!dir.path().join("migrations/002_add_email.toml").exists());
    keel_db(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 1, Pending: 0"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("keel.toml"),
        r#"
[database]
url = "sqlite://state.db"

[migrations]
directory = "db/migrations"
table_name = "history"
"#,
    )
    .unwrap();

    keel_cmd(dir.path())
        .args(["create", "stub"])
        .assert()
        .success();
    assert!(dir.path().join("db/migrations/001_stub.toml").exists());
    assert!(dir.path().join("state.db").exists());

    keel_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 0, Pending: 1"));
}
