//! Relocated builds of Go projects
//!
//! A [`Build`] walks through a fixed lifecycle:
//!
//! ```text
//! Validated ──relocate──▶ Relocated ──resolve_target──▶ PathResolved ──build/run──▶ Built | Ran
//! ```
//!
//! Calling an operation out of order fails with
//! [`BuildError::CallSequenceViolation`] instead of working on half-populated
//! state.
//!
//! # Example
//!
//! ```no_run
//! use gocbox::build::{Build, BuildOptions, CancellationToken, Environment, GoList};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = Environment::capture(&std::env::temp_dir())?;
//! let lister = GoList::new("go");
//! let mut build = Build::new(BuildOptions::default(), &env, &lister)?;
//!
//! // An instrumentation step may rewrite sources listed in build.packages() here.
//! build.build(&CancellationToken::new()).await?;
//! println!("binary written to {}", build.target().unwrap().display());
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod error;
pub mod flags;
pub mod invoke;
pub mod output;
pub mod packages;
pub mod relocate;
pub mod spec;

pub use environment::Environment;
pub use error::BuildError;
pub use invoke::{CancellationToken, Invocation, GOPATH_ENV};
pub use packages::{GoList, Package, PackageGraph, PackageLister};
pub use relocate::{Layout, Workspace, WorkspaceRelocator};

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default toolchain binary
pub const DEFAULT_GO_BIN: &str = "go";

/// Caller supplied configuration for a relocated build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Toolchain binary to invoke
    pub go_bin: PathBuf,
    /// Flags passed to `go build` / `go run`, as typed by the user
    pub build_flags: String,
    /// Package specifier; only `.` is accepted
    pub packages: String,
    /// Where the binary goes; defaults to a name derived from the working directory
    pub output: Option<PathBuf>,
    /// Program passed to `go run -exec`
    pub run_exec: Option<String>,
    /// Arguments passed to the program started by `go run`
    pub run_arguments: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            go_bin: PathBuf::from(DEFAULT_GO_BIN),
            build_flags: String::new(),
            packages: spec::CURRENT_PACKAGE.to_string(),
            output: None,
            run_exec: None,
            run_arguments: Vec::new(),
        }
    }
}

/// Lifecycle state of a [`Build`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Validated,
    Relocated,
    PathResolved,
    Built,
    Ran,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Validated => "validated",
            BuildState::Relocated => "relocated",
            BuildState::PathResolved => "path resolved",
            BuildState::Built => "built",
            BuildState::Ran => "ran",
        };
        f.write_str(name)
    }
}

/// A Go project relocated into a temporary workspace
#[derive(Debug)]
pub struct Build {
    go_bin: PathBuf,
    working_dir: PathBuf,
    build_flags: Vec<String>,
    packages_spec: String,
    output: Option<PathBuf>,
    run_exec: Option<String>,
    run_arguments: Vec<String>,
    workspace: Option<Workspace>,
    target: Option<PathBuf>,
    state: BuildState,
}

impl Build {
    /// Validates, relocates and resolves the output path in one go.
    ///
    /// The returned build is ready for [`Build::build`] or [`Build::run`].
    pub fn new(
        options: BuildOptions,
        env: &Environment,
        lister: &dyn PackageLister,
    ) -> Result<Self, BuildError> {
        let mut build = Self::validated(options, env)?;
        build.relocate(env, lister)?;
        build.resolve_target()?;
        Ok(build)
    }

    /// Checks the options without touching the filesystem
    pub fn validated(options: BuildOptions, env: &Environment) -> Result<Self, BuildError> {
        spec::validate_package_spec(&options.packages)?;
        let build_flags = flags::split_words(&options.build_flags)?;

        Ok(Self {
            go_bin: options.go_bin,
            working_dir: env.working_dir.clone(),
            build_flags,
            packages_spec: options.packages,
            output: options.output,
            run_exec: options.run_exec.filter(|e| !e.is_empty()),
            run_arguments: options.run_arguments,
            workspace: None,
            target: None,
            state: BuildState::Validated,
        })
    }

    /// Copies the project into its temporary workspace
    pub fn relocate(
        &mut self,
        env: &Environment,
        lister: &dyn PackageLister,
    ) -> Result<(), BuildError> {
        self.expect_state(&[BuildState::Validated], "relocate")?;
        if env.working_dir != self.working_dir {
            return Err(BuildError::CallSequenceViolation(format!(
                "build was validated for {} but relocated from {}",
                self.working_dir.display(),
                env.working_dir.display()
            )));
        }

        let workspace = WorkspaceRelocator::new(env, lister).relocate()?;
        self.workspace = Some(workspace);
        self.state = BuildState::Relocated;
        Ok(())
    }

    /// Computes the output binary path; only allowed once, after relocation
    pub fn resolve_target(&mut self) -> Result<&Path, BuildError> {
        self.expect_state(&[BuildState::Relocated], "resolve the output path")?;
        let workspace = self.workspace()?;

        let target = output::resolve_output_path(
            &workspace.temp_dir,
            &self.working_dir,
            workspace.layout.is_module(),
            self.output.as_deref(),
        )?;

        info!(target = %target.display(), "output path resolved");
        self.state = BuildState::PathResolved;
        let target = self.target.insert(target);
        Ok(target.as_path())
    }

    /// The `go build` command for this workspace.
    ///
    /// `-o <target>` is appended to the user's flags on every call without
    /// being stored, so repeated builds run the same command.
    pub fn build_invocation(&self) -> Result<Invocation, BuildError> {
        self.expect_state(
            &[BuildState::PathResolved, BuildState::Built, BuildState::Ran],
            "build",
        )?;
        let target = self.target.as_ref().ok_or_else(|| {
            BuildError::CallSequenceViolation("output path has not been resolved".to_string())
        })?;

        let mut args: Vec<OsString> = vec!["build".into()];
        args.extend(self.build_flags.iter().map(OsString::from));
        args.push("-o".into());
        args.push(target.as_os_str().to_os_string());
        args.push(OsString::from(&self.packages_spec));

        self.invocation(args)
    }

    /// The `go run` command for this workspace
    pub fn run_invocation(&self) -> Result<Invocation, BuildError> {
        self.expect_state(
            &[BuildState::PathResolved, BuildState::Built, BuildState::Ran],
            "run",
        )?;

        let mut args: Vec<OsString> = vec!["run".into()];
        args.extend(self.build_flags.iter().map(OsString::from));
        if let Some(ref exec) = self.run_exec {
            args.push("-exec".into());
            args.push(exec.into());
        }
        args.push(OsString::from(&self.packages_spec));
        args.extend(self.run_arguments.iter().map(OsString::from));

        self.invocation(args)
    }

    /// Builds the binary at [`Build::target`]
    pub async fn build(&mut self, cancel: &CancellationToken) -> Result<(), BuildError> {
        let invocation = self.build_invocation()?;
        info!(cmd = %invocation.command_line(), "go building in temp");
        invocation.execute(cancel).await?;
        info!("go build exit successful");
        self.state = BuildState::Built;
        Ok(())
    }

    /// Runs the main package through `go run`
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), BuildError> {
        let invocation = self.run_invocation()?;
        info!(cmd = %invocation.command_line(), "go running in temp");
        invocation.execute(cancel).await?;
        self.state = BuildState::Ran;
        Ok(())
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Packages found under the original working directory
    pub fn packages(&self) -> Option<&PackageGraph> {
        self.workspace.as_ref().map(|w| &w.packages)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.workspace.as_ref().map(|w| &w.layout)
    }

    pub fn is_module(&self) -> bool {
        self.layout().map(Layout::is_module).unwrap_or(false)
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.layout().map(Layout::project_root)
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.workspace.as_ref().map(|w| w.temp_dir.as_path())
    }

    pub fn temp_working_dir(&self) -> Option<&Path> {
        self.workspace.as_ref().map(|w| w.temp_working_dir.as_path())
    }

    /// Synthetic GOPATH entry for legacy builds
    pub fn new_gopath(&self) -> Option<&Path> {
        match self.layout() {
            Some(Layout::Legacy { new_root, .. }) => Some(new_root),
            _ => None,
        }
    }

    /// GOPATH entries the build started with, for legacy builds
    pub fn original_gopath(&self) -> Option<&[PathBuf]> {
        match self.layout() {
            Some(Layout::Legacy {
                original_gopath, ..
            }) => Some(original_gopath),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn workspace(&self) -> Result<&Workspace, BuildError> {
        self.workspace.as_ref().ok_or_else(|| {
            BuildError::CallSequenceViolation("workspace has not been relocated".to_string())
        })
    }

    fn invocation(&self, args: Vec<OsString>) -> Result<Invocation, BuildError> {
        let workspace = self.workspace()?;
        let env_override = workspace
            .layout
            .gopath_override()
            .map(|gopath| (GOPATH_ENV.to_string(), gopath.clone()));

        Ok(Invocation {
            program: self.go_bin.clone(),
            args,
            current_dir: workspace.temp_working_dir.clone(),
            env_override,
        })
    }

    fn expect_state(&self, allowed: &[BuildState], operation: &str) -> Result<(), BuildError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(BuildError::CallSequenceViolation(format!(
                "cannot {} while the build is {}",
                operation, self.state
            )))
        }
    }
}
