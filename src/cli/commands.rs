use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build and run Go projects in an isolated temporary workspace
#[derive(Parser, Debug)]
#[command(
    name = "gocbox",
    about = "Build and run Go projects in an isolated temporary workspace",
    version,
    author,
    long_about = "gocbox copies a Go project into a private temporary workspace, so it can be \
                  rewritten for coverage collection without touching the original sources, then \
                  builds or runs it there. It also lists the processes registered with a \
                  coverage server."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build the current package in a temporary workspace",
        long_about = "Relocates the project into a temporary workspace and runs `go build` \
                      there. The binary is written next to the original sources unless \
                      --output is given.\n\n\
                      Examples:\n  \
                      gocbox build\n  \
                      gocbox build --buildflags \"-v -tags 'netgo osusergo'\"\n  \
                      gocbox build --output /tmp/app"
    )]
    Build(BuildArgs),

    #[command(
        about = "Run the current package from a temporary workspace",
        long_about = "Relocates the project into a temporary workspace and runs `go run` \
                      there.\n\n\
                      Examples:\n  \
                      gocbox run\n  \
                      gocbox run --exec dlv -- --port 8080"
    )]
    Run(RunArgs),

    #[command(
        about = "List processes registered with the coverage server",
        long_about = "Queries the coverage server for registered agents and prints them as a \
                      table.\n\n\
                      Examples:\n  \
                      gocbox list\n  \
                      gocbox list --host http://10.0.0.5:7777 --wide"
    )]
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PACKAGES",
        default_value = ".",
        help = "Package to build; only the current directory is supported"
    )]
    pub packages: String,

    #[arg(
        long,
        value_name = "FLAGS",
        default_value = "",
        allow_hyphen_values = true,
        help = "Flags passed to go build, quoted as one string"
    )]
    pub buildflags: String,

    #[arg(
        short = 'o',
        long,
        value_name = "PATH",
        help = "Output binary path (defaults to a name derived from the current directory)"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Keep the temporary workspace after building")]
    pub keep_workspace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        value_name = "PACKAGES",
        default_value = ".",
        help = "Package to run; only the current directory is supported"
    )]
    pub packages: String,

    #[arg(
        long,
        value_name = "FLAGS",
        default_value = "",
        allow_hyphen_values = true,
        help = "Flags passed to go run, quoted as one string"
    )]
    pub buildflags: String,

    #[arg(long, value_name = "WRAPPER", help = "Program passed to go run -exec")]
    pub exec: Option<String>,

    #[arg(
        long,
        value_name = "ARGS",
        allow_hyphen_values = true,
        help = "Arguments for the program, quoted as one string"
    )]
    pub arguments: Option<String>,

    #[arg(long, help = "Keep the temporary workspace after running")]
    pub keep_workspace: bool,

    #[arg(last = true, value_name = "ARGS", help = "Arguments for the program")]
    pub program_args: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, value_name = "URL", help = "Coverage server address")]
    pub host: Option<String>,

    #[arg(long, help = "Show hostname and pid, never clip the command line")]
    pub wide: bool,
}
