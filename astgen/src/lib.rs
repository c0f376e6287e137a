//! # astgen
//!
//! Schema-driven generator for AST node type definitions.
//!
//! A schema lists the base types of an AST node family, their variants and
//! each variant's fields. From it the generator produces one file per base
//! type with a constructor, invariant checks and accessors for every variant.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use astgen::{EmitMode, GenerateOptions, Generator, SchemaDecl};
//!
//! let decl = SchemaDecl::from_path("schemas/lox.toml".as_ref())?;
//! let generator = Generator::new(GenerateOptions::default());
//! generator.run(&decl, "include/ast".as_ref(), EmitMode::Write)?;
//! ```
//!
//! ## Architecture
//!
//! The pipeline is strictly linear, and each stage consumes its whole input
//! before the next one starts:
//!
//! - [`schema`] - Schema declaration, loading and validation
//! - [`render`] - Per-variant fragments for a target [`Dialect`]
//! - [`template`] - Skeleton substitution
//! - [`emit`] - Atomic file output, dry-run and check modes
//! - [`pipeline`] - The [`Generator`] tying the stages together
//! - [`error`] - Error types for each stage

pub mod emit;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod template;

// Re-export main types for convenience
pub use emit::{EmitMode, Emitter, GeneratedFile, WriteResult};
pub use error::{EmitError, Error, Result, SchemaError, TemplateError};
pub use pipeline::{GenerateOptions, Generator};
pub use render::{Dialect, DialectKind, Renderer};
pub use schema::{Ownership, Schema, SchemaDecl, ValidationOptions, validate};
pub use template::{Skeleton, TemplateContext, TemplateEngine};
