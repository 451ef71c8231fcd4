//! Snapshot of the process environment a build starts from

use super::BuildError;
use std::env;
use std::path::{Path, PathBuf};

/// Inputs taken from the caller's process once, before relocation.
///
/// Capturing these up front keeps the rest of the flow independent of the
/// process-wide working directory and environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// The directory the build was started from
    pub working_dir: PathBuf,

    /// GOPATH entries, in order
    pub gopath: Vec<PathBuf>,

    /// Directory under which temporary workspaces are created
    pub temp_base: PathBuf,
}

impl Environment {
    pub fn new(working_dir: PathBuf, gopath: Vec<PathBuf>, temp_base: PathBuf) -> Self {
        Self {
            working_dir,
            gopath,
            temp_base,
        }
    }

    /// Captures the current working directory and GOPATH.
    ///
    /// GOPATH falls back to `$HOME/go` like the go command does.
    pub fn capture(temp_base: &Path) -> Result<Self, BuildError> {
        let working_dir = env::current_dir().map_err(BuildError::CurrentDir)?;

        let mut gopath: Vec<PathBuf> = env::var_os("GOPATH")
            .map(|value| {
                env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if gopath.is_empty() {
            if let Some(home) = env::var_os("HOME") {
                gopath.push(PathBuf::from(home).join("go"));
            }
        }

        Ok(Self::new(working_dir, gopath, temp_base.to_path_buf()))
    }

    /// The GOPATH entry whose `src` tree contains the working directory
    pub fn gopath_root(&self) -> Option<&Path> {
        self.gopath
            .iter()
            .find(|root| self.working_dir.starts_with(root.join("src")))
            .map(PathBuf::as_path)
    }
}
