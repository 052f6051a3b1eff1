//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML or has the wrong shape.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A field holds a value outside its accepted range.
    #[error("Invalid config value for {field}: {message}")]
    Validation { field: String, message: String },
}
