//! Workspace relocation
//!
//! Copies the project into a temporary directory so it can be instrumented
//! and built without touching the original tree. Two layouts are supported:
//!
//! - **Module**: a `go.mod` exists in the working directory or an ancestor.
//!   The module root is copied as a whole into the temporary directory.
//! - **Legacy**: no `go.mod`; the project lives under `$GOPATH/src`. The
//!   working directory is copied to the same relative location under the
//!   temporary directory, which becomes the first GOPATH entry of the child.

use super::environment::Environment;
use super::packages::{PackageGraph, PackageLister};
use super::BuildError;
use crate::util::fs::{copy_tree, remove_tree};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Module manifest file name
pub const GO_MOD: &str = "go.mod";

/// Prefix of temporary workspace directory names
pub const TEMP_DIR_PREFIX: &str = "goc-build-";

/// How the project is laid out, which decides relocation and GOPATH handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Module project rooted at the directory holding `go.mod`
    Module { root: PathBuf },

    /// GOPATH project
    Legacy {
        /// The GOPATH entry containing the project
        root: PathBuf,
        /// All original GOPATH entries
        original_gopath: Vec<PathBuf>,
        /// The synthetic GOPATH entry inside the temporary directory
        new_root: PathBuf,
        /// The GOPATH value handed to child processes
        child_gopath: OsString,
    },
}

impl Layout {
    pub fn is_module(&self) -> bool {
        matches!(self, Layout::Module { .. })
    }

    /// Module directory, or GOPATH entry in legacy layout
    pub fn project_root(&self) -> &Path {
        match self {
            Layout::Module { root } | Layout::Legacy { root, .. } => root,
        }
    }

    /// GOPATH override for child processes; `None` in module layout
    pub fn gopath_override(&self) -> Option<&OsString> {
        match self {
            Layout::Module { .. } => None,
            Layout::Legacy { child_gopath, .. } => Some(child_gopath),
        }
    }
}

/// Result of relocating a project
#[derive(Debug, Clone)]
pub struct Workspace {
    pub layout: Layout,
    /// Root of the temporary workspace
    pub temp_dir: PathBuf,
    /// Counterpart of the original working directory inside `temp_dir`
    pub temp_working_dir: PathBuf,
    /// Packages found under the original working directory
    pub packages: PackageGraph,
}

/// Finds the closest directory at or above `dir` containing `go.mod`
pub fn find_module_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|candidate| candidate.join(GO_MOD).is_file())
        .map(Path::to_path_buf)
}

/// Name of the temporary directory for a working directory.
///
/// Derived from a hash of the path so repeated builds of the same project
/// reuse one location.
pub fn temp_folder_name(working_dir: &Path) -> String {
    let digest = Sha256::digest(working_dir.to_string_lossy().as_bytes());
    let hash = hex::encode(digest);
    format!("{}{}", TEMP_DIR_PREFIX, &hash[..6])
}

/// Relocates the project found at the environment's working directory
pub struct WorkspaceRelocator<'a> {
    env: &'a Environment,
    lister: &'a dyn PackageLister,
}

impl<'a> WorkspaceRelocator<'a> {
    pub fn new(env: &'a Environment, lister: &'a dyn PackageLister) -> Self {
        Self { env, lister }
    }

    /// Lists packages, picks the layout and copies the project.
    ///
    /// Any existing directory at the temporary location is removed first.
    pub fn relocate(&self) -> Result<Workspace, BuildError> {
        let working_dir = &self.env.working_dir;
        let packages = self.lister.list(working_dir)?;

        let temp_dir = self.env.temp_base.join(temp_folder_name(working_dir));
        let layout = self.detect_layout(&temp_dir)?;
        let root = layout.project_root().to_path_buf();

        let rel = working_dir.strip_prefix(&root).map_err(|_| {
            BuildError::Relocation(format!(
                "{} is not inside project root {}",
                working_dir.display(),
                root.display()
            ))
        })?;
        let temp_working_dir = temp_dir.join(rel);

        // Module builds need the whole module; GOPATH builds only the project itself.
        let source = if layout.is_module() {
            root.as_path()
        } else {
            working_dir.as_path()
        };
        if temp_dir.starts_with(source) {
            return Err(BuildError::Relocation(format!(
                "temporary directory {} lies inside the project {}",
                temp_dir.display(),
                source.display()
            )));
        }

        remove_tree(&temp_dir).map_err(relocation_error)?;

        let destination = if layout.is_module() {
            temp_dir.clone()
        } else {
            temp_working_dir.clone()
        };
        let copied = copy_tree(source, &destination).map_err(relocation_error)?;

        info!(
            module = layout.is_module(),
            files = copied,
            packages = packages.len(),
            temp_dir = %temp_dir.display(),
            "project copied to temporary workspace"
        );

        Ok(Workspace {
            layout,
            temp_dir,
            temp_working_dir,
            packages,
        })
    }

    fn detect_layout(&self, temp_dir: &Path) -> Result<Layout, BuildError> {
        if let Some(root) = find_module_root(&self.env.working_dir) {
            debug!(root = %root.display(), "module layout");
            return Ok(Layout::Module { root });
        }

        let root = self.env.gopath_root().ok_or_else(|| {
            BuildError::Relocation(format!(
                "no {} found and {} is not inside any GOPATH entry",
                GO_MOD,
                self.env.working_dir.display()
            ))
        })?;

        let new_root = temp_dir.to_path_buf();
        let entries = std::iter::once(new_root.clone()).chain(self.env.gopath.iter().cloned());
        let child_gopath = std::env::join_paths(entries)
            .map_err(|e| BuildError::Relocation(format!("cannot build GOPATH: {}", e)))?;

        debug!(root = %root.display(), gopath = ?child_gopath, "legacy GOPATH layout");

        Ok(Layout::Legacy {
            root: root.to_path_buf(),
            original_gopath: self.env.gopath.clone(),
            new_root,
            child_gopath,
        })
    }
}

fn relocation_error(err: anyhow::Error) -> BuildError {
    BuildError::Relocation(format!("{:#}", err))
}
