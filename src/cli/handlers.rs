//! Command handlers
//!
//! Each handler returns the process exit code; only `main` exits.

use super::commands::{BuildArgs, ListArgs, RunArgs};
use crate::build::{
    flags, Build, BuildError, BuildOptions, CancellationToken, Environment, GoList, PackageLister,
};
use crate::client::{render_agents, AgentClient, TerminalWidth, WidthProvider};
use crate::config::GocboxConfig;
use crate::util::remove_tree;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Exit code for failures that carry no child exit status
pub const EXIT_FAILURE: i32 = 1;

/// Exit code after Ctrl-C, following the shell convention
pub const EXIT_CANCELLED: i32 = 130;

pub async fn handle_build(args: &BuildArgs, config: &GocboxConfig, cancel: &CancellationToken) -> i32 {
    let result: Result<PathBuf> = async {
        let env = Environment::capture(&config.temp_base)?;
        let lister = Arc::new(GoList::new(&config.go_bin));
        execute_build(args, config, &env, lister, cancel).await
    }
    .await;

    match result {
        Ok(target) => {
            info!(target = %target.display(), "build finished");
            0
        }
        Err(e) => report_failure("build", &e),
    }
}

pub async fn handle_run(args: &RunArgs, config: &GocboxConfig, cancel: &CancellationToken) -> i32 {
    let result: Result<()> = async {
        let env = Environment::capture(&config.temp_base)?;
        let lister = Arc::new(GoList::new(&config.go_bin));
        execute_run(args, config, &env, lister, cancel).await
    }
    .await;

    match result {
        Ok(()) => 0,
        Err(e) => report_failure("run", &e),
    }
}

pub async fn handle_list(args: &ListArgs, config: &GocboxConfig, cancel: &CancellationToken) -> i32 {
    let result = tokio::select! {
        listing = execute_list(args, config, &TerminalWidth) => listing,
        _ = cancel.cancelled() => {
            info!("listing cancelled");
            return EXIT_CANCELLED;
        }
    };

    match result {
        Ok(table) => {
            print!("{}", table);
            0
        }
        Err(e) => report_failure("list", &e),
    }
}

/// Relocates and builds, returning the path of the produced binary
pub async fn execute_build(
    args: &BuildArgs,
    config: &GocboxConfig,
    env: &Environment,
    lister: Arc<dyn PackageLister>,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    let options = BuildOptions {
        go_bin: PathBuf::from(&config.go_bin),
        build_flags: args.buildflags.clone(),
        packages: args.packages.clone(),
        output: args.output.clone(),
        ..Default::default()
    };

    let mut build = prepare(options, env, lister, args.keep_workspace, cancel).await?;
    log_workspace(&build);

    let outcome = build.build(cancel).await;
    cleanup(&build, args.keep_workspace);
    outcome?;

    let target = build
        .target()
        .map(PathBuf::from)
        .context("Build finished without an output path")?;
    Ok(target)
}

/// Relocates and runs the main package through `go run`
pub async fn execute_run(
    args: &RunArgs,
    config: &GocboxConfig,
    env: &Environment,
    lister: Arc<dyn PackageLister>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut run_arguments = match args.arguments.as_deref() {
        Some(arguments) => flags::split_words(arguments)?,
        None => Vec::new(),
    };
    run_arguments.extend(args.program_args.iter().cloned());

    let options = BuildOptions {
        go_bin: PathBuf::from(&config.go_bin),
        build_flags: args.buildflags.clone(),
        packages: args.packages.clone(),
        run_exec: args.exec.clone(),
        run_arguments,
        ..Default::default()
    };

    let mut build = prepare(options, env, lister, args.keep_workspace, cancel).await?;
    log_workspace(&build);

    let outcome = build.run(cancel).await;
    cleanup(&build, args.keep_workspace);
    outcome?;
    Ok(())
}

/// Fetches the agent list and renders it as a table
pub async fn execute_list(
    args: &ListArgs,
    config: &GocboxConfig,
    widths: &dyn WidthProvider,
) -> Result<String> {
    let host = args.host.as_deref().unwrap_or(&config.host);
    let client = AgentClient::new(host, config.request_timeout())?;

    let agents = client
        .list_agents()
        .await
        .with_context(|| format!("Failed to list agents from {}", client.host()))?;
    debug!(count = agents.len(), "agents listed");

    Ok(render_agents(&agents, args.wide, widths))
}

/// Validates and relocates on the blocking pool so Ctrl-C is seen while
/// `go list` runs or the project is copied.
///
/// A relocation that completes after cancellation removes its own workspace.
async fn prepare(
    options: BuildOptions,
    env: &Environment,
    lister: Arc<dyn PackageLister>,
    keep_workspace: bool,
    cancel: &CancellationToken,
) -> Result<Build> {
    let env = env.clone();
    let cancelled = cancel.clone();
    let task = tokio::task::spawn_blocking(move || {
        let build = Build::new(options, &env, lister.as_ref())?;
        if cancelled.is_cancelled() {
            cleanup(&build, keep_workspace);
        }
        Ok::<_, BuildError>(build)
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BuildError::Cancelled {
            command: "workspace relocation".to_string(),
        }
        .into()),
        joined = task => {
            let build = joined
                .context("Workspace preparation task failed")?
                .context("Failed to prepare workspace")?;
            Ok(build)
        }
    }
}

fn log_workspace(build: &Build) {
    if let Some(temp_dir) = build.temp_dir() {
        info!(
            temp_dir = %temp_dir.display(),
            module = build.is_module(),
            packages = build.packages().map(|p| p.len()).unwrap_or(0),
            "workspace relocated"
        );
    }
    if let Some(gopath) = build.new_gopath() {
        debug!(gopath = %gopath.display(), "legacy GOPATH layout");
    }
}

fn cleanup(build: &Build, keep_workspace: bool) {
    let Some(temp_dir) = build.temp_dir() else {
        return;
    };

    if keep_workspace {
        info!(temp_dir = %temp_dir.display(), "keeping workspace");
        return;
    }

    match remove_tree(temp_dir) {
        Ok(()) => debug!(temp_dir = %temp_dir.display(), "workspace removed"),
        Err(e) => warn!(error = %e, "failed to remove workspace"),
    }
}

/// Logs `err` and maps it to an exit code
fn report_failure(operation: &str, err: &anyhow::Error) -> i32 {
    let code = exit_code_for(err);
    if code == EXIT_CANCELLED {
        info!("{} cancelled", operation);
    } else {
        error!(error = %format!("{:#}", err), "{} failed", operation);
        eprintln!("Error: {:#}", err);
    }
    code
}

/// The child's exit code when a toolchain process failed, 130 when cancelled, else 1
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::Cancelled { .. }) => EXIT_CANCELLED,
        Some(build_error) => build_error.exit_code().unwrap_or(EXIT_FAILURE),
        None => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::PackageGraph;
    use crate::client::FixedWidth;
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    struct NoPackages;

    /// Stands in for a `go list` that takes a long time to answer
    struct SlowPackages(Duration);

    impl PackageLister for SlowPackages {
        fn list(&self, _dir: &Path) -> Result<PackageGraph, BuildError> {
            std::thread::sleep(self.0);
            Ok(PackageGraph::new())
        }
    }

    impl PackageLister for NoPackages {
        fn list(&self, _dir: &Path) -> Result<PackageGraph, BuildError> {
            Ok(PackageGraph::new())
        }
    }

    fn config(temp_base: &Path, go_bin: &str) -> GocboxConfig {
        GocboxConfig {
            go_bin: go_bin.to_string(),
            temp_base: temp_base.to_path_buf(),
            host: "http://127.0.0.1:7777".to_string(),
            request_timeout_secs: 5,
            log_level: "info".to_string(),
            log_json: false,
        }
    }

    fn module_project(temp: &TempDir) -> Environment {
        let project = temp.path().join("project/my_app");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("go.mod"), "module example.com/my_app\n").unwrap();
        fs::write(project.join("main.go"), "package main\nfunc main() {}\n").unwrap();
        let temp_base = temp.path().join("tmp");
        fs::create_dir_all(&temp_base).unwrap();
        Environment::new(project, vec![], temp_base)
    }

    fn build_args(packages: &str) -> BuildArgs {
        BuildArgs {
            packages: packages.to_string(),
            buildflags: String::new(),
            output: None,
            keep_workspace: false,
        }
    }

    #[test]
    fn test_exit_code_mapping() {
        let err = anyhow::Error::new(BuildError::ProcessExecution {
            command: "go build".to_string(),
            code: Some(2),
            reason: "exit status: 2".to_string(),
        });
        assert_eq!(exit_code_for(&err), 2);

        let err = anyhow::Error::new(BuildError::Cancelled {
            command: "go run .".to_string(),
        });
        assert_eq!(exit_code_for(&err), EXIT_CANCELLED);

        let err = anyhow::Error::new(BuildError::InvalidPackageSpec("./sub".to_string()))
            .context("Failed to prepare workspace");
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }

    #[tokio::test]
    async fn test_execute_build_rejects_package_spec() {
        let temp = TempDir::new().unwrap();
        let env = module_project(&temp);
        let config = config(&env.temp_base, "go");

        let err = execute_build(
            &build_args("./sub"),
            &config,
            &env,
            Arc::new(NoPackages),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidPackageSpec(_))
        ));
        assert_eq!(fs::read_dir(&env.temp_base).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_build_failure_removes_workspace() {
        let temp = TempDir::new().unwrap();
        let env = module_project(&temp);
        let config = config(&env.temp_base, "false");

        let err = execute_build(
            &build_args("."),
            &config,
            &env,
            Arc::new(NoPackages),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(exit_code_for(&err), 1);
        assert_eq!(fs::read_dir(&env.temp_base).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_build_keeps_workspace_on_request() {
        let temp = TempDir::new().unwrap();
        let env = module_project(&temp);
        let config = config(&env.temp_base, "true");
        let mut args = build_args(".");
        args.keep_workspace = true;

        let target = execute_build(&args, &config, &env, Arc::new(NoPackages), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(target, env.working_dir.join("my-app"));
        let kept: Vec<_> = fs::read_dir(&env.temp_base).unwrap().collect();
        assert_eq!(kept.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_build_cancelled_during_relocation() {
        let temp = TempDir::new().unwrap();
        let env = module_project(&temp);
        let config = config(&env.temp_base, "go");
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = execute_build(
            &build_args("."),
            &config,
            &env,
            Arc::new(SlowPackages(Duration::from_secs(2))),
            &cancel,
        )
        .await
        .unwrap_err();

        assert_eq!(exit_code_for(&err), EXIT_CANCELLED);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_execute_list_invalid_host() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path(), "go");
        let args = ListArgs {
            host: Some("not a url".to_string()),
            wide: false,
        };

        let result = execute_list(&args, &config, &FixedWidth(None)).await;
        assert!(result.is_err());
    }
}
