//! Rendering of validated schemas into per-variant fragments.
//!
//! The renderer is a pure function of the schema, the dialect and the
//! accessor prefix. Variants are rendered in lexicographic order of name;
//! that order is part of the output contract.

pub mod cpp;
pub mod dialect;
pub mod rust;

use convert_case::{Case, Casing};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::schema::{BaseTypeSpec, FieldSpec, Schema, VariantSpec};

pub use dialect::{Dialect, DialectKind, Part};

/// Template values for one list item.
pub type Bindings = BTreeMap<String, String>;

/// A field together with the names and types a dialect resolved for it.
#[derive(Debug, Clone)]
pub struct FieldView<'a> {
    pub spec: &'a FieldSpec,

    /// Identifier for the parameter and the stored member.
    pub ident: String,

    /// Element type: the base type name for children, the alias-resolved
    /// type expression for values.
    pub ty: String,

    /// Accessor method name.
    pub accessor: String,
}

/// Rendered pieces of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVariant {
    pub name: String,
    pub params: Vec<String>,
    pub initializers: Vec<String>,
    pub members: Vec<String>,
    pub checks: Vec<String>,
    pub accessors: Vec<String>,
}

/// Rendered pieces of one base type, ready for the template engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBase {
    pub name: String,
    pub file_name: String,

    /// Includes in emission order: referenced base types (defined in this
    /// run or declared external) first, then the includes the schema
    /// declares.
    pub includes: Vec<String>,

    /// Variants in lexicographic order of name.
    pub variants: Vec<RenderedVariant>,
}

/// Renders schemas through a dialect.
pub struct Renderer<'d> {
    dialect: &'d dyn Dialect,
    accessor_prefix: String,
}

impl<'d> Renderer<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            accessor_prefix: dialect.default_accessor_prefix().to_string(),
        }
    }

    /// Override the dialect's accessor prefix.
    pub fn with_accessor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.accessor_prefix = prefix.into();
        self
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Render every base type of a schema, in lexicographic order.
    pub fn render(&self, schema: &Schema) -> Vec<RenderedBase> {
        schema
            .bases()
            .map(|base| self.render_base(schema, base))
            .collect()
    }

    /// Render one base type.
    pub fn render_base(&self, schema: &Schema, base: &BaseTypeSpec) -> RenderedBase {
        let variants: Vec<_> = base
            .variants()
            .map(|variant| self.render_variant(schema, variant))
            .collect();

        debug!(
            dialect = self.dialect.id(),
            base = base.name(),
            variants = variants.len(),
            "Rendered base type"
        );

        RenderedBase {
            name: base.name().to_string(),
            file_name: self.dialect.file_name(base.name()),
            includes: self.includes(schema, base),
            variants,
        }
    }

    /// Render one variant; fields are processed in declaration order.
    pub fn render_variant(&self, schema: &Schema, variant: &VariantSpec) -> RenderedVariant {
        let mut rendered = RenderedVariant {
            name: variant.name().to_string(),
            params: Vec::new(),
            initializers: Vec::new(),
            members: Vec::new(),
            checks: Vec::new(),
            accessors: Vec::new(),
        };

        for spec in variant.fields() {
            let field = self.view(schema, spec);

            rendered.params.push(self.dialect.param(&field));
            rendered.initializers.push(self.dialect.initializer(&field));
            rendered.members.push(self.dialect.member(&field));

            if spec.ownership().is_required_child() {
                if let Some(check) = self.dialect.ownership_check(variant.name(), &field) {
                    rendered.checks.push(check);
                }
            }
            if let Some(predicate) = spec.check() {
                rendered
                    .checks
                    .push(self.dialect.predicate_check(variant.name(), &field, predicate));
            }

            rendered.accessors.push(self.dialect.accessor(&field));
        }

        rendered
    }

    /// Template values for a rendered variant.
    pub fn bindings(&self, variant: &RenderedVariant) -> Bindings {
        let join = |part: Part, items: &[String]| items.join(self.dialect.separator(part));

        let mut out = Bindings::new();
        out.insert("name".to_string(), variant.name.clone());
        out.insert("name_lower".to_string(), variant.name.to_lowercase());
        out.insert("name_snake".to_string(), variant.name.to_case(Case::Snake));
        out.insert("params".to_string(), join(Part::Params, &variant.params));
        out.insert(
            "initializers".to_string(),
            join(Part::Initializers, &variant.initializers),
        );
        out.insert("members".to_string(), join(Part::Members, &variant.members));
        out.insert("checks".to_string(), join(Part::Checks, &variant.checks));
        out.insert(
            "accessors".to_string(),
            join(Part::Accessors, &variant.accessors),
        );
        self.dialect.variant_bindings(variant, &mut out);
        out
    }

    fn view<'a>(&self, schema: &Schema, spec: &'a FieldSpec) -> FieldView<'a> {
        let ty = if spec.ownership().is_child() {
            spec.ty().to_string()
        } else {
            schema.resolve_type(spec.ty(), self.dialect.id()).to_string()
        };

        FieldView {
            spec,
            ident: self.dialect.field_ident(spec.name()),
            ty,
            accessor: self
                .dialect
                .accessor_name(&self.accessor_prefix, spec.name()),
        }
    }

    fn includes(&self, schema: &Schema, base: &BaseTypeSpec) -> Vec<String> {
        let mut seen = BTreeSet::new();
        base.referenced_bases()
            .into_iter()
            .filter(|name| schema.defines(name) || base.externals().contains(*name))
            .map(|name| self.dialect.base_include(name))
            .chain(base.includes_for(self.dialect.id()).iter().cloned())
            .filter(|include| seen.insert(include.clone()))
            .collect()
    }
}

/// Accessor name in the `getLeft` style: prefix plus the field name with its
/// first letter capitalised. The rest of the name is kept as written.
pub fn accessor_name(prefix: &str, field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) if !prefix.is_empty() => {
            format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str())
        }
        _ => field.to_string(),
    }
}

/// Replace `$` in an author predicate with the expression naming the stored
/// field value.
pub fn bind_predicate(predicate: &str, stored: &str) -> String {
    predicate.replace('$', stored)
}
