//! The generation pipeline: validate, render, template, emit.
//!
//! Every base type is rendered into memory before anything is emitted, so a
//! schema or template problem never leaves partial output behind.

use convert_case::{Case, Casing};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::emit::{EmitMode, Emitter, GeneratedFile, WriteResult};
use crate::error::Result;
use crate::render::{Bindings, Dialect, DialectKind, RenderedBase, Renderer};
use crate::schema::{Schema, SchemaDecl, ValidationOptions, validate};
use crate::template::{Skeleton, TemplateContext, TemplateEngine};

/// Default C++ namespace for generated headers.
pub const DEFAULT_NAMESPACE: &str = "ast";

/// Options for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Target dialect.
    pub dialect: DialectKind,

    /// Minimum number of fields per variant.
    pub min_fields: usize,

    /// Accessor prefix; the dialect's default when `None`.
    pub accessor_prefix: Option<String>,

    /// Skeleton file replacing the dialect's built-in skeleton.
    pub skeleton: Option<PathBuf>,

    /// Namespace wrapping the generated definitions (C++ only).
    pub namespace: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            min_fields: 1,
            accessor_prefix: None,
            skeleton: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn with_dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    pub fn with_accessor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.accessor_prefix = Some(prefix.into());
        self
    }

    pub fn with_skeleton(mut self, path: impl Into<PathBuf>) -> Self {
        self.skeleton = Some(path.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Runs the pipeline for one set of options.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GenerateOptions,
}

impl Generator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    fn dialect(&self) -> &'static dyn Dialect {
        self.options.dialect.dialect()
    }

    /// Validate a declaration for the configured dialect.
    pub fn validate(&self, decl: &SchemaDecl) -> Result<Schema> {
        let mut options = ValidationOptions::default()
            .with_min_fields(self.options.min_fields)
            .with_dialect(self.options.dialect);
        if let Some(prefix) = &self.options.accessor_prefix {
            options = options.with_accessor_prefix(prefix.clone());
        }
        Ok(validate(decl, &options)?)
    }

    /// Generate every file for a declaration, in memory.
    pub fn generate(&self, decl: &SchemaDecl) -> Result<Vec<GeneratedFile>> {
        let schema = self.validate(decl)?;
        self.generate_schema(&schema)
    }

    /// Generate every file for an already validated schema, in memory.
    pub fn generate_schema(&self, schema: &Schema) -> Result<Vec<GeneratedFile>> {
        let dialect = self.dialect();
        let skeleton = match &self.options.skeleton {
            Some(path) => Skeleton::load(path)?,
            None => Skeleton::builtin(dialect)?,
        };

        let mut renderer = Renderer::new(dialect);
        if let Some(prefix) = &self.options.accessor_prefix {
            renderer = renderer.with_accessor_prefix(prefix.clone());
        }

        let mut files = Vec::new();
        for base in renderer.render(schema) {
            let context = self.context(&renderer, &base);
            let content = TemplateEngine::render(&skeleton, &context)?;
            debug!(file = %base.file_name, bytes = content.len(), "Templated base type");
            files.push(GeneratedFile {
                base: base.name,
                file_name: base.file_name,
                content,
            });
        }
        Ok(files)
    }

    /// Generate and emit into `dir`.
    pub fn run(&self, decl: &SchemaDecl, dir: &Path, mode: EmitMode) -> Result<Vec<WriteResult>> {
        let files = self.generate(decl)?;
        Ok(Emitter::new(mode).emit(dir, &files)?)
    }

    fn context(&self, renderer: &Renderer<'_>, base: &RenderedBase) -> TemplateContext {
        let dialect = renderer.dialect();
        let variants: Vec<Bindings> = base.variants.iter().map(|v| renderer.bindings(v)).collect();
        let includes: Vec<Bindings> = base
            .includes
            .iter()
            .map(|path| Bindings::from([("path".to_string(), path.clone())]))
            .collect();

        TemplateContext::new()
            .with_value(
                "banner",
                format!(
                    "Generated by astgen ({}) from the {} schema. Do not edit.",
                    dialect.name(),
                    base.name
                ),
            )
            .with_value("dialect", dialect.id())
            .with_value("base_name", base.name.clone())
            .with_value("base_lower", base.name.to_lowercase())
            .with_value("base_snake", base.name.to_case(Case::Snake))
            .with_value("namespace", self.options.namespace.clone())
            .with_list("variants", variants)
            .with_list("includes", includes)
    }
}
