//! Integration tests for the prax-testsync CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the prax-testsync binary
#[allow(deprecated)]
fn testsync_cmd() -> Command {
    Command::cargo_bin("prax-testsync").unwrap()
}

/// A project directory with one SQLite test connection and its migrations.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("test.db");
        let config = format!(
            r#"
[connections.test]
driver = "sqlite"
url = '{}'
migrations = true
"#,
            db.display()
        );
        fs::write(dir.path().join("prax-testsync.toml"), config).unwrap();

        let project = Self { dir };
        project.migration(
            "20200208100000_create_articles",
            "CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT);",
        );
        project
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> PathBuf {
        self.path().join("prax-testsync.toml")
    }

    fn migration(&self, dir_name: &str, sql: &str) {
        let dir = self.path().join("migrations").join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("up.sql"), sql).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = testsync_cmd();
        cmd.arg("--config").arg(self.config()).env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_help_command() {
    testsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prax TestSync"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("truncate"))
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_missing_config() {
    let dir = TempDir::new().unwrap();
    testsync_cmd()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_from_env() {
    let project = Project::new();
    testsync_cmd()
        .env("PRAX_TESTSYNC_CONFIG", project.config())
        .arg("tables")
        .arg("test")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tables"));
}

#[test]
fn test_sync_builds_schema() {
    let project = Project::new();

    project
        .cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt 1 connection(s): test"));

    project
        .cmd()
        .args(["tables", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("articles"))
        .stdout(predicate::str::contains("phinxlog").not());

    project
        .cmd()
        .args(["tables", "test", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("phinxlog"));
}

#[test]
fn test_second_sync_is_noop() {
    let project = Project::new();
    project.cmd().arg("sync").assert().success();

    project
        .cmd()
        .args(["sync", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No migration changes detected."))
        .stdout(predicate::str::contains("Test databases are up to date"));
}

#[test]
fn test_status_before_and_after_sync() {
    let project = Project::new();

    project
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("20200208100000"))
        .stdout(predicate::str::contains("migration 20200208100000 is pending"));

    project.cmd().arg("sync").assert().success();

    project
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("is pending").not());
}

#[test]
fn test_new_migration_rebuilds() {
    let project = Project::new();
    project.cmd().arg("sync").assert().success();

    project.migration(
        "20200301100000_create_comments",
        "CREATE TABLE comments (id INTEGER PRIMARY KEY);",
    );
    project
        .cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt 1 connection(s)"));

    project
        .cmd()
        .args(["tables", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("comments"));
}

#[test]
fn test_failed_migration_exits_non_zero() {
    let project = Project::new();
    project.migration("20200301100000_broken", "CREATE TABLE (;");

    project
        .cmd()
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Migration for connection test failed."))
        .stderr(predicate::str::contains("1 of 1 job(s) failed"));
}

#[test]
fn test_truncate_keeps_history() {
    let project = Project::new();
    project.cmd().arg("sync").assert().success();

    project
        .cmd()
        .args(["truncate", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Truncated all tables of 'test'"));

    project
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("is pending").not());
}

#[test]
fn test_drop_removes_tables() {
    let project = Project::new();
    project.cmd().arg("sync").assert().success();

    project.cmd().args(["drop", "test"]).assert().success();

    project
        .cmd()
        .args(["tables", "test", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tables in 'test'"));
}

#[test]
fn test_dump_loads_files() {
    let project = Project::new();
    let schema = project.path().join("schema.sql");
    fs::write(
        &schema,
        "CREATE TABLE users (id INTEGER PRIMARY KEY);\nCREATE TABLE posts (id INTEGER PRIMARY KEY);",
    )
    .unwrap();

    project
        .cmd()
        .arg("dump")
        .arg("test")
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 file(s) into 'test'"));

    project
        .cmd()
        .args(["tables", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("posts"))
        .stdout(predicate::str::contains("users"));
}

#[test]
fn test_dump_default_lands_in_test() {
    let project = Project::new();
    let app_db = project.path().join("app.db");
    let mut config = fs::read_to_string(project.config()).unwrap();
    config.push_str(&format!(
        "\n[connections.default]\ndriver = \"sqlite\"\nurl = '{}'\n",
        app_db.display()
    ));
    fs::write(project.config(), config).unwrap();

    let schema = project.path().join("schema.sql");
    fs::write(&schema, "CREATE TABLE imported (id INTEGER PRIMARY KEY);").unwrap();

    project
        .cmd()
        .args(["dump", "default"])
        .arg(&schema)
        .assert()
        .success();

    project
        .cmd()
        .args(["tables", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("imported"));
    assert!(!app_db.exists(), "the application database was opened");
}

#[test]
fn test_dump_missing_file() {
    let project = Project::new();
    project
        .cmd()
        .args(["dump", "test"])
        .arg(project.path().join("missing.sql"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.sql"));
}

#[test]
fn test_unknown_connection() {
    let project = Project::new();
    project
        .cmd()
        .args(["truncate", "test_nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}
