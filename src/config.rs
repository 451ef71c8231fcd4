//! Configuration management for gocbox
//!
//! Settings are loaded from environment variables with sensible defaults.
//! Command line flags override them in the CLI handlers.
//!
//! # Environment Variables
//!
//! - `GOCBOX_GO_BIN`: Go toolchain binary - default: "go"
//! - `GOCBOX_TMPDIR`: Base directory for temporary workspaces - default: system temp dir
//! - `GOCBOX_HOST`: Coverage server address - default: "http://127.0.0.1:7777"
//! - `GOCBOX_REQUEST_TIMEOUT`: Timeout in seconds - default: "30"
//! - `GOCBOX_LOG_LEVEL`: Logging level - default: "info"
//! - `GOCBOX_LOG_JSON`: JSON log output (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use gocbox::GocboxConfig;
//!
//! let config = GocboxConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::build::DEFAULT_GO_BIN;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "http://127.0.0.1:7777";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration for gocbox
#[derive(Debug, Clone)]
pub struct GocboxConfig {
    /// Go toolchain binary used for list, build and run
    pub go_bin: String,

    /// Base directory under which temporary workspaces are created
    pub temp_base: PathBuf,

    /// Coverage server address for agent listing
    pub host: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for GocboxConfig {
    /// Loads GOCBOX_* environment variables, falling back to defaults
    fn default() -> Self {
        let go_bin = env::var("GOCBOX_GO_BIN")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GO_BIN.to_string());

        let temp_base = env::var_os("GOCBOX_TMPDIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let host = env::var("GOCBOX_HOST")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let request_timeout_secs = env::var("GOCBOX_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let log_level = env::var("GOCBOX_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("GOCBOX_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            go_bin,
            temp_base,
            host,
            request_timeout_secs,
            log_level,
            log_json,
        }
    }
}

impl GocboxConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for an out of range timeout, an
    /// unknown log level or an empty toolchain binary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.go_bin.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Go binary must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Display for GocboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gocbox Configuration:")?;
        writeln!(f, "  Go Binary: {}", self.go_bin)?;
        writeln!(f, "  Temp Base: {}", self.temp_base.display())?;
        writeln!(f, "  Host: {}", self.host)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Log JSON: {}", self.log_json)?;
        Ok(())
    }
}
