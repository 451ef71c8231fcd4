//! Package metadata reported by `go list -json`
//!
//! The relocator records every package under the working directory so that an
//! instrumentation step can find the source files it needs to rewrite inside
//! the temporary workspace.

use super::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Import path to package metadata, ordered by import path
pub type PackageGraph = BTreeMap<String, Package>;

/// A single package as printed by `go list -json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Package {
    pub dir: PathBuf,
    pub import_path: String,
    pub name: String,
    pub target: String,
    /// GOPATH entry or GOROOT containing the package
    pub root: PathBuf,
    pub module: Option<ModuleInfo>,
    pub go_files: Vec<String>,
    pub cgo_files: Vec<String>,
    pub test_go_files: Vec<String>,
    #[serde(rename = "XTestGoFiles")]
    pub xtest_go_files: Vec<String>,
    pub deps: Vec<String>,
    pub error: Option<PackageError>,
}

impl Package {
    /// Whether this package is a `main` package producing a binary
    pub fn is_command(&self) -> bool {
        self.name == "main"
    }

    /// Absolute paths of the Go sources (including cgo files) of this package
    pub fn source_files(&self) -> Vec<PathBuf> {
        self.go_files
            .iter()
            .chain(self.cgo_files.iter())
            .map(|f| self.dir.join(f))
            .collect()
    }
}

/// Module a package belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModuleInfo {
    pub path: String,
    pub dir: PathBuf,
    pub go_mod: PathBuf,
    pub main: bool,
}

/// Load error reported by `go list` for a package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageError {
    pub pos: String,
    pub err: String,
}

/// Parses the concatenated JSON objects printed by `go list -json`
pub fn parse_go_list(output: &[u8]) -> Result<PackageGraph, BuildError> {
    let mut graph = PackageGraph::new();

    for package in serde_json::Deserializer::from_slice(output).into_iter::<Package>() {
        let package = package.map_err(|e| {
            BuildError::Relocation(format!("cannot decode go list output: {}", e))
        })?;

        if let Some(ref err) = package.error {
            warn!(
                package = %package.import_path,
                error = %err.err,
                "go list reported a package error"
            );
        }

        graph.insert(package.import_path.clone(), package);
    }

    Ok(graph)
}

/// Source of package metadata for a working directory
pub trait PackageLister: Send + Sync {
    /// Lists every package under `dir`
    fn list(&self, dir: &Path) -> Result<PackageGraph, BuildError>;
}

/// Lists packages by running `go list -json ./...`
#[derive(Debug, Clone)]
pub struct GoList {
    go_bin: PathBuf,
}

impl GoList {
    pub fn new(go_bin: impl Into<PathBuf>) -> Self {
        Self {
            go_bin: go_bin.into(),
        }
    }
}

impl PackageLister for GoList {
    fn list(&self, dir: &Path) -> Result<PackageGraph, BuildError> {
        debug!(go = %self.go_bin.display(), dir = %dir.display(), "listing packages");

        let output = Command::new(&self.go_bin)
            .args(["list", "-json", "./..."])
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                BuildError::Relocation(format!(
                    "cannot execute {} list: {}",
                    self.go_bin.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::Relocation(format!(
                "go list -json ./... failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let graph = parse_go_list(&output.stdout)?;
        debug!(count = graph.len(), "packages listed");
        Ok(graph)
    }
}
