//! CLI integration tests
//!
//! These tests verify the command-line interface behavior, including:
//! - Command parsing and help output
//! - Exit codes, including the child's exit code on toolchain failure
//! - Configuration validation

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn gocbox_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gocbox"))
}

/// Runs gocbox in `dir` with a private temp base and no inherited GOCBOX_* overrides
fn gocbox(dir: &Path, temp_base: &Path, args: &[&str]) -> Output {
    Command::new(gocbox_bin())
        .args(args)
        .current_dir(dir)
        .env("GOCBOX_TMPDIR", temp_base)
        .env_remove("GOCBOX_GO_BIN")
        .env_remove("GOCBOX_HOST")
        .env_remove("GOCBOX_REQUEST_TIMEOUT")
        .env_remove("GOCBOX_LOG_LEVEL")
        .output()
        .expect("Failed to execute gocbox")
}

fn create_module(dir: &TempDir) -> (PathBuf, PathBuf) {
    let root = fs::canonicalize(dir.path()).unwrap();
    let project = root.join("my_app");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("go.mod"), "module example.com/my_app\n").unwrap();
    fs::write(project.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

    let temp_base = root.join("tmp");
    fs::create_dir_all(&temp_base).unwrap();
    (project, temp_base)
}

#[test]
fn test_cli_help() {
    let output = Command::new(gocbox_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute gocbox");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gocbox"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("list"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(gocbox_bin())
        .arg("--version")
        .output()
        .expect("Failed to execute gocbox");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_build_rejects_sub_package() {
    let temp = TempDir::new().unwrap();
    let (project, temp_base) = create_module(&temp);

    let output = gocbox(&project, &temp_base, &["build", "./sub"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("only '.' is supported"), "stderr: {}", stderr);
    assert_eq!(fs::read_dir(&temp_base).unwrap().count(), 0);
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let (project, temp_base) = create_module(&temp);

    let output = Command::new(gocbox_bin())
        .args(["list"])
        .current_dir(&project)
        .env("GOCBOX_TMPDIR", &temp_base)
        .env("GOCBOX_REQUEST_TIMEOUT", "0")
        .output()
        .expect("Failed to execute gocbox");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Request timeout"), "stderr: {}", stderr);
}

#[test]
fn test_list_invalid_host() {
    let temp = TempDir::new().unwrap();
    let output = gocbox(temp.path(), temp.path(), &["list", "--host", "not a url"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse url"), "stderr: {}", stderr);
}

#[test]
fn test_list_wide_table() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v2/rpcagents")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items":[{"id":"7","remoteip":"10.1.1.1","hostname":"web","cmdline":"/srv/web --listen :80","pid":"4242"}]}"#,
        )
        .create();

    let temp = TempDir::new().unwrap();
    let output = gocbox(
        temp.path(),
        temp.path(),
        &["list", "--host", &server.url(), "--wide"],
    );

    mock.assert();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "ID   REMOTEIP   HOSTNAME   PID    CMD");
    assert_eq!(lines[1], "7    10.1.1.1   web        4242   /srv/web --listen :80");
}

#[cfg(unix)]
mod toolchain {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-go");
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    const LIST_ONE_PACKAGE: &str = r#"if [ "$1" = "list" ]; then
  echo '{"ImportPath":"example.com/my_app","Name":"main"}'
  exit 0
fi
"#;

    #[test]
    fn test_build_writes_binary_and_removes_workspace() {
        let temp = TempDir::new().unwrap();
        let (project, temp_base) = create_module(&temp);
        let go = write_script(
            temp_base.parent().unwrap(),
            &format!(
                "{}prev=\"\"\nfor a in \"$@\"; do\n  if [ \"$prev\" = \"-o\" ]; then touch \"$a\"; fi\n  prev=\"$a\"\ndone\n",
                LIST_ONE_PACKAGE
            ),
        );

        let output = Command::new(gocbox_bin())
            .args(["build", "--buildflags=-v"])
            .current_dir(&project)
            .env("GOCBOX_TMPDIR", &temp_base)
            .env("GOCBOX_GO_BIN", &go)
            .output()
            .expect("Failed to execute gocbox");

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        assert!(project.join("my-app").is_file());
        assert_eq!(fs::read_dir(&temp_base).unwrap().count(), 0);
    }

    #[test]
    fn test_build_propagates_child_exit_code() {
        let temp = TempDir::new().unwrap();
        let (project, temp_base) = create_module(&temp);
        let go = write_script(
            temp_base.parent().unwrap(),
            &format!("{}exit 3\n", LIST_ONE_PACKAGE),
        );

        let output = Command::new(gocbox_bin())
            .args(["build", "--keep-workspace"])
            .current_dir(&project)
            .env("GOCBOX_TMPDIR", &temp_base)
            .env("GOCBOX_GO_BIN", &go)
            .output()
            .expect("Failed to execute gocbox");

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(fs::read_dir(&temp_base).unwrap().count(), 1);
    }
}
