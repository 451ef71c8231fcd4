//! Toolchain process invocation
//!
//! Commands are spawned directly from an argument vector inside the
//! relocated working directory. Standard output and error are inherited so
//! toolchain progress shows up live. A GOPATH override, when present, is set
//! on the child only.

use super::BuildError;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Environment variable overridden for legacy GOPATH builds
pub const GOPATH_ENV: &str = "GOPATH";

/// Cloneable signal used to abort a running invocation
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once `cancel` has been called on any clone
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// A fully described toolchain command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: PathBuf,
    /// Extra variable set on the child, e.g. `GOPATH`
    pub env_override: Option<(String, OsString)>,
}

impl Invocation {
    /// Human readable command line for logs and error messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawns the command and waits for it to exit.
    ///
    /// Cancelling `cancel` kills the child and returns `Cancelled`.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<(), BuildError> {
        let command_line = self.command_line();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.current_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some((key, value)) = &self.env_override {
            debug!(key = %key, value = ?value, "overriding child environment");
            command.env(key, value);
        }

        debug!(cmd = %command_line, dir = %self.current_dir.display(), "spawning toolchain");

        let mut child = command.spawn().map_err(|source| {
            error!(cmd = %command_line, error = %source, "failed to start");
            BuildError::ProcessStart {
                command: command_line.clone(),
                source,
            }
        })?;

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let status = match outcome {
            Some(status) => status.map_err(|e| BuildError::ProcessExecution {
                command: command_line.clone(),
                code: None,
                reason: e.to_string(),
            })?,
            None => {
                info!(cmd = %command_line, "cancelled, killing child");
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "kill after cancellation failed");
                }
                return Err(BuildError::Cancelled {
                    command: command_line,
                });
            }
        };

        if !status.success() {
            error!(cmd = %command_line, %status, "toolchain exited unsuccessfully");
            return Err(BuildError::ProcessExecution {
                command: command_line,
                code: status.code(),
                reason: status.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sh(script: &str, dir: PathBuf) -> Invocation {
        Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into()],
            current_dir: dir,
            env_override: None,
        }
    }

    #[test]
    fn test_command_line() {
        let inv = Invocation {
            program: PathBuf::from("go"),
            args: vec!["build".into(), "-o".into(), "/out/app".into(), ".".into()],
            current_dir: PathBuf::from("/tmp"),
            env_override: None,
        };
        assert_eq!(inv.command_line(), "go build -o /out/app .");
    }

    #[tokio::test]
    async fn test_execute_success_in_current_dir() {
        let temp = TempDir::new().unwrap();
        let inv = sh("touch marker", temp.path().to_path_buf());

        inv.execute(&CancellationToken::new()).await.unwrap();

        assert!(temp.path().join("marker").exists());
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_sets_override_on_child_only() {
        let temp = TempDir::new().unwrap();
        let mut inv = sh("echo \"$GOPATH\" > gopath.txt", temp.path().to_path_buf());
        inv.env_override = Some((GOPATH_ENV.to_string(), "/tmp/ws:/orig".into()));

        let before = std::env::var_os(GOPATH_ENV);
        inv.execute(&CancellationToken::new()).await.unwrap();

        let written = std::fs::read_to_string(temp.path().join("gopath.txt")).unwrap();
        assert_eq!(written.trim(), "/tmp/ws:/orig");
        assert_eq!(std::env::var_os(GOPATH_ENV), before);
    }

    #[tokio::test]
    async fn test_execute_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let inv = sh("exit 3", temp.path().to_path_buf());

        let err = inv.execute(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, BuildError::ProcessExecution { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let temp = TempDir::new().unwrap();
        let inv = Invocation {
            program: PathBuf::from("/nonexistent/go-12345"),
            args: vec![],
            current_dir: temp.path().to_path_buf(),
            env_override: None,
        };

        let err = inv.execute(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, BuildError::ProcessStart { .. }));
    }

    #[tokio::test]
    async fn test_execute_cancelled() {
        let temp = TempDir::new().unwrap();
        let inv = sh("sleep 30", temp.path().to_path_buf());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(10), inv.execute(&token))
            .await
            .expect("cancellation should stop the child");
        assert!(matches!(result, Err(BuildError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_cancel_before_execute() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        // Already-cancelled tokens resolve immediately
        token.cancelled().await;
    }
}
