//! gocbox - relocated builds of Go projects
//!
//! Copies a Go project into a private temporary workspace so its sources can
//! be rewritten (for example to inject coverage counters) without touching
//! the originals, then drives `go build` or `go run` inside that workspace.
//!
//! # Core Concepts
//!
//! - **Layout**: a project is either a module (a `go.mod` in the working
//!   directory or above) or a legacy GOPATH project
//! - **Workspace**: the temporary copy, at `<tmp>/goc-build-<hash>`, that all
//!   toolchain commands run in
//! - **Target**: the output binary path, resolved once against the original
//!   working directory
//!
//! # Example Usage
//!
//! ```no_run
//! use gocbox::build::{Build, BuildOptions, CancellationToken, Environment, GoList};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = Environment::capture(&std::env::temp_dir())?;
//! let options = BuildOptions {
//!     build_flags: "-v".to_string(),
//!     ..Default::default()
//! };
//! let mut build = Build::new(options, &env, &GoList::new("go"))?;
//! build.build(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`build`]: validation, relocation, output path resolution and invocation
//! - [`client`]: coverage server agent listing and table rendering
//! - [`cli`]: command line parsing and handlers
//! - [`config`]: environment based configuration

pub mod build;
pub mod cli;
pub mod client;
pub mod config;
pub mod util;

pub use build::{Build, BuildError, BuildOptions, BuildState, CancellationToken, Environment};
pub use client::{Agent, AgentClient, ListError};
pub use config::{ConfigError, GocboxConfig};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
