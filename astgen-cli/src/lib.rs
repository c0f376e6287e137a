//! # astgen-cli
//!
//! CLI library for generating AST node type definitions from a schema.
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`generate`] - A single generation run
//! - [`error`] - Error types and exit codes

pub mod config;
pub mod error;
pub mod generate;

// Re-export main types for convenience
pub use config::{CliArgs, Config, ConfigManager};
pub use error::{CliError, CliResult, ConfigError};
