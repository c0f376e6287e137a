//! Error types for the generation pipeline.
//!
//! Each pipeline stage has its own error enum so that callers can tell a
//! broken schema from a broken skeleton or an unwritable output directory.
//! All of them are fatal to a run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error raised by the generation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema could not be loaded or is invalid.
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// The skeleton could not be located or applied.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The output could not be written.
    #[error("Failed to write output: {0}")]
    Emit(#[from] EmitError),
}

/// Error raised while loading or validating a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("Failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file extension is not a supported format.
    #[error("Unsupported schema format for {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    /// The schema text is not a well-formed declaration.
    #[error("Malformed schema declaration in {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Two base types share a name.
    #[error("Base type '{base}' is declared more than once")]
    DuplicateBase { base: String },

    /// A base type declares no variants.
    #[error("Base type '{base}' declares no variants")]
    EmptyBase { base: String },

    /// A variant reuses the name of its own base type.
    #[error("Variant '{base}.{base}' shadows its base type")]
    VariantShadowsBase { base: String },

    /// Two variants of one base type share a name.
    #[error("Variant '{base}.{variant}' is declared more than once")]
    DuplicateVariant { base: String, variant: String },

    /// Two fields of one variant share a name.
    #[error("Field '{base}.{variant}.{field}' is declared more than once")]
    DuplicateField {
        base: String,
        variant: String,
        field: String,
    },

    /// An owned-child field names a type that is neither defined nor external.
    #[error(
        "Field '{base}.{variant}.{field}' references unknown base type '{type_name}' \
         (define it or list it in `externals`)"
    )]
    UnresolvedType {
        base: String,
        variant: String,
        field: String,
        type_name: String,
    },

    /// A variant has fewer fields than the configured minimum.
    #[error("Variant '{base}.{variant}' has {found} field(s), at least {min} required")]
    TooFewFields {
        base: String,
        variant: String,
        found: usize,
        min: usize,
    },

    /// A name is not a valid identifier.
    #[error("Invalid {what} name '{name}' in {location}")]
    InvalidIdentifier {
        what: &'static str,
        name: String,
        location: String,
    },

    /// A field declaration is structurally malformed.
    #[error("Malformed field '{base}.{variant}.{field}': {message}")]
    MalformedField {
        base: String,
        variant: String,
        field: String,
        message: String,
    },

    /// A name collides with a word reserved by the target dialect.
    #[error("Name '{name}' in {location} is reserved in the {dialect} dialect")]
    ReservedName {
        name: String,
        location: String,
        dialect: &'static str,
    },

    /// Two fields of one variant generate the same member or method name.
    #[error(
        "Field '{base}.{variant}.{field}' generates `{generated}`, already used by field \
         '{other}' in the {dialect} dialect"
    )]
    NameCollision {
        base: String,
        variant: String,
        field: String,
        other: String,
        generated: String,
        dialect: &'static str,
    },

    /// A variant reuses a type name of the namespace all output shares.
    #[error("Variant '{base}.{variant}' collides with {other} in the shared {dialect} namespace")]
    NamespaceCollision {
        base: String,
        variant: String,
        other: String,
        dialect: &'static str,
    },

    /// Multiple validation errors collected.
    #[error("{} schema errors:\n{}", .0.len(), format_errors(.0))]
    Multiple(Vec<SchemaError>),
}

/// Error raised while loading or applying a skeleton.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The skeleton file could not be read.
    #[error("Skeleton not found at {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The skeleton references a value the context does not provide.
    #[error("Unknown placeholder '{name}' at line {line}")]
    UnknownPlaceholder { name: String, line: usize },

    /// A `for` block iterates a list the context does not provide.
    #[error("Unknown list '{name}' at line {line}")]
    UnknownList { name: String, line: usize },

    /// A `{% ... %}` tag that is not `for` or `endfor`.
    #[error("Unknown tag '{tag}' at line {line}")]
    UnknownTag { tag: String, line: usize },

    /// Unterminated tag or unbalanced block.
    #[error("Malformed skeleton at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Error raised while writing output files.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The output directory does not exist.
    #[error("Output directory does not exist: {path}")]
    MissingDirectory { path: PathBuf },

    /// The output path exists but is not a directory.
    #[error("Output path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Failed to write or persist a file.
    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an existing file in check mode.
    #[error("Failed to read existing file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Format multiple errors for display.
fn format_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl SchemaError {
    /// Create a parse error for the given origin (a path or `<inline>`).
    pub fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a malformed field error.
    pub fn malformed_field(
        base: &str,
        variant: &str,
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedField {
            base: base.to_string(),
            variant: variant.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Collapse a list of errors into a single error.
    ///
    /// Returns `None` for an empty list.
    pub fn collect(mut errors: Vec<SchemaError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Number of individual problems this error carries.
    pub fn count(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}

impl TemplateError {
    /// Create a malformed skeleton error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}
