//! CLI error type.

use std::fmt;

use glyphpack::config::ConfigError;
use glyphpack::BuildError;

/// Errors surfaced to the user; any of them exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or flag problem.
    Config(String),
    /// The font build failed.
    Build(BuildError),
    /// The cache file could not be read or written.
    Cache(String),
    /// The async runtime could not be started.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Build(e) => write!(f, "Build failed: {}", e),
            CliError::Cache(msg) => write!(f, "Cache error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Build(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        CliError::Build(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
