//! Utility modules for gocbox
//!
//! - Structured logging setup
//! - Directory tree copy and removal

pub mod fs;
pub mod logging;

pub use fs::{copy_tree, remove_tree};
pub use logging::{init_logging, parse_level, LoggingConfig};
