//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `astgen.toml` files
//! and merging with command-line arguments.

use astgen::{DialectKind, GenerateOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliResult, ConfigError};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "astgen.toml";

/// Schema file used when neither the config nor the command line names one.
pub const DEFAULT_SCHEMA: &str = "ast.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema input.
    pub schema: SchemaConfig,

    /// Output dialect and layout.
    pub output: OutputConfig,

    /// Naming conventions.
    pub naming: NamingConfig,

    /// Skeleton override.
    pub template: TemplateConfig,
}

/// Schema input configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Path to the schema file (`.toml` or `.json`).
    pub path: PathBuf,

    /// Minimum number of fields per variant.
    pub min_fields: usize,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target dialect.
    pub dialect: DialectKind,

    /// Namespace wrapping C++ definitions.
    pub namespace: String,
}

/// Naming convention configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Accessor prefix; the dialect's own default when unset.
    pub accessor_prefix: Option<String>,
}

/// Skeleton configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Skeleton file replacing the built-in one.
    pub path: Option<PathBuf>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SCHEMA),
            min_fields: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            namespace: astgen::pipeline::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Pipeline options for this configuration.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            dialect: self.output.dialect,
            min_fields: self.schema.min_fields,
            accessor_prefix: self.naming.accessor_prefix.clone(),
            skeleton: self.template.path.clone(),
            namespace: self.output.namespace.clone(),
        }
    }

    /// Check values the TOML types alone cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let is_ident = |s: &str| {
            s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };

        if !self.output.namespace.split("::").all(is_ident) {
            return Err(ConfigError::invalid_value(
                "output.namespace",
                format!("'{}' is not a namespace name", self.output.namespace),
            ));
        }

        if let Some(prefix) = &self.naming.accessor_prefix {
            if !prefix.is_empty() && !is_ident(prefix) {
                return Err(ConfigError::invalid_value(
                    "naming.accessor_prefix",
                    format!("'{}' is not an identifier", prefix),
                ));
            }
        }

        Ok(())
    }

    /// Resolve relative paths against the directory holding the config file.
    fn resolve_relative(&mut self, base: &Path) {
        if self.schema.path.is_relative() {
            self.schema.path = base.join(&self.schema.path);
        }
        if let Some(path) = self.template.path.as_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// With no path, `astgen.toml` in the working directory is used when it
    /// exists and defaults otherwise. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                if !default.exists() {
                    debug!("No configuration file, using defaults");
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(&config_path, e.message()))?;

        if let Some(base) = config_path.parent() {
            config.resolve_relative(base);
        }
        config.validate()?;

        debug!(path = %config_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref schema) = args.schema {
            config.schema.path = schema.clone();
        }

        if let Some(dialect) = args.dialect {
            config.output.dialect = dialect;
        }

        if let Some(ref template) = args.template {
            config.template.path = Some(template.clone());
        }

        config
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Schema file override.
    pub schema: Option<PathBuf>,

    /// Dialect override.
    pub dialect: Option<DialectKind>,

    /// Skeleton override.
    pub template: Option<PathBuf>,
}
