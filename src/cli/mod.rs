pub mod commands;
pub mod handlers;

pub use commands::{BuildArgs, CliArgs, Commands, ListArgs, RunArgs};
pub use handlers::{handle_build, handle_list, handle_run, EXIT_CANCELLED, EXIT_FAILURE};
