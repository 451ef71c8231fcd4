//! Error types for workspace relocation and toolchain invocation

use thiserror::Error;

/// Errors that can occur while preparing or driving a build
#[derive(Debug, Error)]
pub enum BuildError {
    /// Only the current-directory package (`.`) can be built
    #[error("only '.' is supported as the package to build, got '{0}'")]
    InvalidPackageSpec(String),

    /// An operation was called before the state it depends on exists
    #[error("wrong call sequence: {0}")]
    CallSequenceViolation(String),

    /// Copying the project or listing its packages failed
    #[error("workspace relocation failed: {0}")]
    Relocation(String),

    /// Build flags or run arguments could not be split into words
    #[error("invalid flags '{flags}': {reason}")]
    InvalidFlags { flags: String, reason: String },

    /// The toolchain process could not be spawned
    #[error("failed to execute `{command}`: {source}")]
    ProcessStart {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain process exited unsuccessfully or could not be waited on
    #[error("`{command}` failed: {reason}")]
    ProcessExecution {
        command: String,
        code: Option<i32>,
        reason: String,
    },

    /// The invocation was cancelled and the child was killed
    #[error("`{command}` was cancelled")]
    Cancelled { command: String },

    /// The working directory could not be determined
    #[error("cannot get current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl BuildError {
    /// Exit code of the failed child process, when there is one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::ProcessExecution { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_only_for_execution_failures() {
        let err = BuildError::ProcessExecution {
            command: "go build .".to_string(),
            code: Some(2),
            reason: "exit status: 2".to_string(),
        };
        assert_eq!(err.exit_code(), Some(2));

        let err = BuildError::InvalidPackageSpec("./sub".to_string());
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = BuildError::InvalidPackageSpec("./...".to_string());
        assert!(err.to_string().contains("'./...'"));

        let err = BuildError::CallSequenceViolation("relocate first".to_string());
        assert!(err.to_string().starts_with("wrong call sequence"));
    }
}
