//! Error types for the CLI.
//!
//! Every error maps to a sysexits-style process exit code, so scripts can
//! tell a bad invocation from a bad schema or an unwritable directory.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Process exit codes.
pub mod exit {
    /// `--check` found stale or missing files.
    pub const OUT_OF_DATE: u8 = 1;
    /// Missing or extra arguments.
    pub const USAGE: u8 = 64;
    /// Invalid schema.
    pub const DATA: u8 = 65;
    /// Invalid skeleton.
    pub const SOFTWARE: u8 = 70;
    /// Output could not be written.
    pub const IO: u8 = 74;
    /// Invalid configuration.
    pub const CONFIG: u8 = 78;
}

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command line could not be parsed.
    #[error("{0}")]
    Usage(String),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error raised by the generation pipeline.
    #[error(transparent)]
    Generate(#[from] astgen::Error),

    /// `--check` found files that need regenerating.
    #[error("{count} generated file(s) are out of date")]
    OutOfDate { count: usize },
}

impl CliError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => exit::USAGE,
            CliError::Config(_) => exit::CONFIG,
            CliError::Generate(astgen::Error::Schema(_)) => exit::DATA,
            CliError::Generate(astgen::Error::Template(_)) => exit::SOFTWARE,
            CliError::Generate(astgen::Error::Emit(_)) => exit::IO,
            CliError::OutOfDate { .. } => exit::OUT_OF_DATE,
        }
    }
}

impl From<astgen::SchemaError> for CliError {
    fn from(error: astgen::SchemaError) -> Self {
        CliError::Generate(error.into())
    }
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
