//! Schema validation.
//!
//! Turns a [`SchemaDecl`] into a normalized [`Schema`], collecting every
//! problem found along the way rather than stopping at the first one. When a
//! target dialect is known, names are also checked against what that dialect
//! will generate from them.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::decl::{BaseDecl, FieldDecl, SchemaDecl, VariantDecl};
use super::{BaseTypeSpec, FieldSpec, Ownership, Schema, VariantSpec};
use crate::error::SchemaError;
use crate::render::{Dialect, DialectKind};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

/// Knobs for schema validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Minimum number of fields every variant must declare.
    pub min_fields: usize,

    /// Dialect whose naming rules apply, if any.
    pub dialect: Option<DialectKind>,

    /// Accessor prefix; the dialect's default when `None`.
    pub accessor_prefix: Option<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_fields: 1,
            dialect: None,
            accessor_prefix: None,
        }
    }
}

impl ValidationOptions {
    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    /// Check names against what a dialect generates from them.
    pub fn with_dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_accessor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.accessor_prefix = Some(prefix.into());
        self
    }
}

/// Validate a declaration and normalize it into a [`Schema`].
pub fn validate(decl: &SchemaDecl, options: &ValidationOptions) -> Result<Schema, SchemaError> {
    let mut validator = Validator {
        options,
        dialect: options.dialect.map(DialectKind::dialect),
        defined: decl.bases.iter().map(|b| b.name.as_str()).collect(),
        errors: Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut bases = BTreeMap::new();
    for base in &decl.bases {
        if !seen.insert(base.name.as_str()) {
            validator.errors.push(SchemaError::DuplicateBase {
                base: base.name.clone(),
            });
            continue;
        }
        if let Some(spec) = validator.base(base) {
            bases.insert(base.name.clone(), spec);
        }
    }

    if let Some(dialect) = validator.dialect.filter(|d| d.shared_type_namespace()) {
        validator.namespace(decl, dialect);
    }

    if let Some(err) = SchemaError::collect(validator.errors) {
        warn!(errors = err.count(), "Schema validation failed");
        return Err(err);
    }

    debug!(
        bases = bases.len(),
        variants = bases.values().map(|b| b.variants.len()).sum::<usize>(),
        "Schema validated"
    );

    Ok(Schema {
        bases,
        aliases: decl.aliases.clone(),
    })
}

struct Validator<'a> {
    options: &'a ValidationOptions,
    dialect: Option<&'static dyn Dialect>,
    defined: HashSet<&'a str>,
    errors: Vec<SchemaError>,
}

impl Validator<'_> {
    fn base(&mut self, base: &BaseDecl) -> Option<BaseTypeSpec> {
        let errors_before = self.errors.len();

        self.type_name("base type", &base.name, || base.name.clone());
        for external in &base.externals {
            self.type_name("external", external, || format!("{}.externals", base.name));
        }

        if base.variants.is_empty() {
            self.errors.push(SchemaError::EmptyBase {
                base: base.name.clone(),
            });
        }

        let externals: BTreeSet<String> = base.externals.iter().cloned().collect();
        let mut variants = BTreeMap::new();
        for variant in &base.variants {
            if variants.contains_key(&variant.name) {
                self.errors.push(SchemaError::DuplicateVariant {
                    base: base.name.clone(),
                    variant: variant.name.clone(),
                });
                continue;
            }
            let spec = self.variant(&base.name, &externals, variant);
            variants.insert(variant.name.clone(), spec);
        }

        (self.errors.len() == errors_before).then(|| BaseTypeSpec {
            name: base.name.clone(),
            variants,
            externals,
            includes: base.includes.clone(),
        })
    }

    fn variant(
        &mut self,
        base: &str,
        externals: &BTreeSet<String>,
        variant: &VariantDecl,
    ) -> VariantSpec {
        self.type_name("variant", &variant.name, || format!("{}.{}", base, variant.name));
        if variant.name == base {
            self.errors.push(SchemaError::VariantShadowsBase {
                base: base.to_string(),
            });
        }

        if variant.fields.len() < self.options.min_fields {
            self.errors.push(SchemaError::TooFewFields {
                base: base.to_string(),
                variant: variant.name.clone(),
                found: variant.fields.len(),
                min: self.options.min_fields,
            });
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(variant.fields.len());
        for field in &variant.fields {
            if !seen.insert(field.name.as_str()) {
                self.errors.push(SchemaError::DuplicateField {
                    base: base.to_string(),
                    variant: variant.name.clone(),
                    field: field.name.clone(),
                });
                continue;
            }
            self.field(base, &variant.name, externals, field);
            fields.push(FieldSpec {
                name: field.name.clone(),
                ty: field.ty.trim().to_string(),
                ownership: field.kind,
                repeated: field.repeated,
                check: field.check.as_ref().map(|c| c.trim().to_string()),
            });
        }

        if let Some(dialect) = self.dialect {
            self.generated_names(dialect, base, variant);
        }

        VariantSpec {
            name: variant.name.clone(),
            fields,
        }
    }

    fn field(
        &mut self,
        base: &str,
        variant: &str,
        externals: &BTreeSet<String>,
        field: &FieldDecl,
    ) {
        let location = || format!("{}.{}.{}", base, variant, field.name);
        if self.identifier("field", &field.name, location) {
            if let Some(dialect) = self.dialect {
                let ident = dialect.field_ident(&field.name);
                self.reserved(dialect, &field.name, &ident, location);
            }
        }

        let ty = field.ty.trim();
        if ty.is_empty() {
            self.errors.push(SchemaError::malformed_field(
                base,
                variant,
                &field.name,
                "type is empty",
            ));
            return;
        }
        if ty.contains(['\n', '\r']) {
            self.errors.push(SchemaError::malformed_field(
                base,
                variant,
                &field.name,
                "type spans multiple lines",
            ));
            return;
        }

        if field.kind.is_child() {
            if !IDENTIFIER.is_match(ty) {
                self.errors.push(SchemaError::malformed_field(
                    base,
                    variant,
                    &field.name,
                    format!(
                        "{} child type must be a base type name, found `{}`",
                        field.kind.as_str(),
                        ty
                    ),
                ));
            } else if !self.defined.contains(ty) && !externals.contains(ty) {
                self.errors.push(SchemaError::UnresolvedType {
                    base: base.to_string(),
                    variant: variant.to_string(),
                    field: field.name.clone(),
                    type_name: ty.to_string(),
                });
            }
        }

        if field.repeated && field.kind == Ownership::OptionalOwnedChild {
            self.errors.push(SchemaError::malformed_field(
                base,
                variant,
                &field.name,
                "optional children cannot be repeated; use an exclusive repeated field",
            ));
        }

        if let Some(check) = &field.check {
            if check.trim().is_empty() || check.contains(['\n', '\r']) {
                self.errors.push(SchemaError::malformed_field(
                    base,
                    variant,
                    &field.name,
                    "check must be a non-empty single-line expression",
                ));
            }
        }
    }

    /// Member and accessor names of one variant must be distinct once the
    /// dialect has cased and escaped them.
    fn generated_names(&mut self, dialect: &'static dyn Dialect, base: &str, variant: &VariantDecl) {
        let options = self.options;
        let prefix = options
            .accessor_prefix
            .as_deref()
            .unwrap_or(dialect.default_accessor_prefix());

        let mut members: BTreeMap<String, &str> = BTreeMap::new();
        let mut methods: BTreeMap<String, &str> = BTreeMap::new();
        let mut seen = HashSet::new();

        for field in variant.fields.iter().filter(|f| seen.insert(f.name.as_str())) {
            let ident = dialect.field_ident(&field.name);
            let scope = if dialect.members_share_method_scope() {
                &mut methods
            } else {
                &mut members
            };
            if let Some(other) = scope.insert(ident.clone(), &field.name) {
                self.collision(dialect, base, &variant.name, &field.name, other, ident);
                continue;
            }

            let accessor = dialect.accessor_name(prefix, &field.name);
            if dialect.generated_methods().contains(&accessor.as_str()) {
                self.errors.push(SchemaError::malformed_field(
                    base,
                    &variant.name,
                    &field.name,
                    format!("accessor `{}` collides with a generated method", accessor),
                ));
                continue;
            }
            if let Some(other) = methods.insert(accessor.clone(), &field.name) {
                self.collision(dialect, base, &variant.name, &field.name, other, accessor);
            }
        }
    }

    fn collision(
        &mut self,
        dialect: &dyn Dialect,
        base: &str,
        variant: &str,
        field: &str,
        other: &str,
        generated: String,
    ) {
        self.errors.push(SchemaError::NameCollision {
            base: base.to_string(),
            variant: variant.to_string(),
            field: field.to_string(),
            other: other.to_string(),
            generated,
            dialect: dialect.id(),
        });
    }

    /// Variants of every base become types in one namespace; none may reuse
    /// the name of a base type, an external or another base's variant.
    fn namespace(&mut self, decl: &SchemaDecl, dialect: &dyn Dialect) {
        let mut owners: BTreeMap<&str, String> = BTreeMap::new();
        for base in &decl.bases {
            owners
                .entry(base.name.as_str())
                .or_insert_with(|| format!("base type '{}'", base.name));
        }
        for external in decl.bases.iter().flat_map(|b| b.externals.iter()) {
            owners
                .entry(external.as_str())
                .or_insert_with(|| format!("external type '{}'", external));
        }

        let mut seen_bases = HashSet::new();
        for base in decl.bases.iter().filter(|b| seen_bases.insert(b.name.as_str())) {
            let mut seen_variants = HashSet::new();
            for variant in base
                .variants
                .iter()
                .filter(|v| v.name != base.name && seen_variants.insert(v.name.as_str()))
            {
                match owners.get(variant.name.as_str()) {
                    Some(other) => self.errors.push(SchemaError::NamespaceCollision {
                        base: base.name.clone(),
                        variant: variant.name.clone(),
                        other: other.clone(),
                        dialect: dialect.id(),
                    }),
                    None => {
                        owners.insert(
                            variant.name.as_str(),
                            format!("variant '{}.{}'", base.name, variant.name),
                        );
                    }
                }
            }
        }
    }

    /// A base, variant or external name: a valid identifier the dialect can
    /// use as a type name.
    fn type_name(&mut self, what: &'static str, name: &str, location: impl Fn() -> String) {
        if self.identifier(what, name, &location) {
            if let Some(dialect) = self.dialect {
                self.reserved(dialect, name, name, location);
            }
        }
    }

    fn identifier(&mut self, what: &'static str, name: &str, location: impl Fn() -> String) -> bool {
        if IDENTIFIER.is_match(name) {
            return true;
        }
        self.errors.push(SchemaError::InvalidIdentifier {
            what,
            name: name.to_string(),
            location: location(),
        });
        false
    }

    /// Reject a name whose generated form is still reserved after escaping.
    fn reserved(
        &mut self,
        dialect: &dyn Dialect,
        name: &str,
        generated: &str,
        location: impl Fn() -> String,
    ) {
        if dialect.is_reserved(generated) {
            self.errors.push(SchemaError::ReservedName {
                name: name.to_string(),
                location: location(),
                dialect: dialect.id(),
            });
        }
    }
}
