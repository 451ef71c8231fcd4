//! Structured logging setup for gocbox
//!
//! Initializes the `tracing` ecosystem once per process. Logs are written to
//! stderr so toolchain and program output on stdout stays clean.
//!
//! # Example
//!
//! ```no_run
//! use gocbox::util::logging::{init_logging, LoggingConfig};
//! use tracing::{info, Level};
//!
//! init_logging(LoggingConfig::with_level(Level::DEBUG));
//! info!(dir = "/tmp/goc-build-1a2b3c", "workspace ready");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., gocbox::build) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    /// INFO level, plain console output, targets on, locations off
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Debug level with file and line numbers, for `-v`
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_location: true,
            ..Default::default()
        }
    }
}

/// Parses a log level from a string
///
/// Unknown values fall back to `Level::INFO`.
///
/// ```
/// use gocbox::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("gocbox={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    // If RUST_LOG is not set, keep the HTTP stack quiet
    if env::var("RUST_LOG").is_err() {
        for noisy in ["hyper=warn", "hyper_util=warn", "reqwest=warn"] {
            if let Ok(directive) = noisy.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Initializes the logging system with the provided configuration
///
/// Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}
