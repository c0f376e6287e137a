//! Schema model for AST node families.
//!
//! A schema is authored as a [`SchemaDecl`] (usually loaded from a TOML or
//! JSON file) and turned into a validated, normalized [`Schema`] by
//! [`validate`]. Only the validated form is accepted by the renderer.
//!
//! - [`decl`] - Declarative input types, file loading and builders
//! - [`validate`] - Structural and reference validation

pub mod decl;
pub mod validate;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use decl::{BaseDecl, FieldDecl, SchemaDecl, VariantDecl};
pub use validate::{ValidationOptions, validate};

/// How a field relates to the node that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ownership {
    /// A sub-node exclusively owned by its parent; never absent once built.
    #[serde(rename = "exclusive")]
    ExclusiveOwnedChild,

    /// A sub-node exclusively owned by its parent; absence is valid.
    #[serde(rename = "optional")]
    OptionalOwnedChild,

    /// A required sub-node whose storage may be shared with other nodes.
    #[serde(rename = "shared")]
    SharedOwnedChild,

    /// A plain value (token, literal payload) with no ownership semantics.
    #[serde(rename = "value")]
    ValueField,
}

impl Ownership {
    /// Whether the field holds a sub-node of some base type.
    pub fn is_child(self) -> bool {
        !matches!(self, Ownership::ValueField)
    }

    /// Whether the field holds a sub-node that must never be absent.
    pub fn is_required_child(self) -> bool {
        matches!(
            self,
            Ownership::ExclusiveOwnedChild | Ownership::SharedOwnedChild
        )
    }

    /// The keyword used for this kind in schema files.
    pub fn as_str(self) -> &'static str {
        match self {
            Ownership::ExclusiveOwnedChild => "exclusive",
            Ownership::OptionalOwnedChild => "optional",
            Ownership::SharedOwnedChild => "shared",
            Ownership::ValueField => "value",
        }
    }
}

/// A validated field of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) ty: String,
    pub(crate) ownership: Ownership,
    pub(crate) repeated: bool,
    pub(crate) check: Option<String>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type: a base type name for children, a type expression or
    /// alias for values.
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Author-supplied predicate, emitted verbatim by the renderer.
    pub fn check(&self) -> Option<&str> {
        self.check.as_deref()
    }
}

/// A validated variant: one concrete node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldSpec>,
}

impl VariantSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// A validated base type with its variants ordered by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTypeSpec {
    pub(crate) name: String,
    pub(crate) variants: BTreeMap<String, VariantSpec>,
    pub(crate) externals: BTreeSet<String>,
    pub(crate) includes: BTreeMap<String, Vec<String>>,
}

impl BaseTypeSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in lexicographic order of name.
    pub fn variants(&self) -> impl Iterator<Item = &VariantSpec> {
        self.variants.values()
    }

    pub fn variant(&self, name: &str) -> Option<&VariantSpec> {
        self.variants.get(name)
    }

    /// Base types defined outside this generation run that fields may name.
    pub fn externals(&self) -> &BTreeSet<String> {
        &self.externals
    }

    /// Includes declared for the given dialect, in authoring order.
    pub fn includes_for(&self, dialect: &str) -> &[String] {
        self.includes.get(dialect).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Base type names referenced by owned-child fields, excluding this one.
    pub fn referenced_bases(&self) -> BTreeSet<&str> {
        self.variants
            .values()
            .flat_map(|v| v.fields.iter())
            .filter(|f| f.ownership.is_child() && f.ty != self.name)
            .map(|f| f.ty.as_str())
            .collect()
    }
}

/// A validated, normalized schema.
///
/// Base types and their variants are kept in lexicographic order, so
/// iterating a schema is deterministic regardless of authoring order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub(crate) bases: BTreeMap<String, BaseTypeSpec>,
    pub(crate) aliases: BTreeMap<String, BTreeMap<String, String>>,
}

impl Schema {
    /// Base types in lexicographic order of name.
    pub fn bases(&self) -> impl Iterator<Item = &BaseTypeSpec> {
        self.bases.values()
    }

    pub fn base(&self, name: &str) -> Option<&BaseTypeSpec> {
        self.bases.get(name)
    }

    /// Whether `name` is a base type defined in this schema.
    pub fn defines(&self, name: &str) -> bool {
        self.bases.contains_key(name)
    }

    /// Resolve a value type through the alias table for a dialect.
    ///
    /// Types without an alias entry for the dialect are returned unchanged.
    pub fn resolve_type<'a>(&'a self, ty: &'a str, dialect: &str) -> &'a str {
        self.aliases
            .get(ty)
            .and_then(|targets| targets.get(dialect))
            .map(String::as_str)
            .unwrap_or(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str, ownership: Ownership) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            ty: ty.to_string(),
            ownership,
            repeated: false,
            check: None,
        }
    }

    #[test]
    fn test_ownership_classification() {
        assert!(Ownership::ExclusiveOwnedChild.is_required_child());
        assert!(Ownership::SharedOwnedChild.is_required_child());
        assert!(!Ownership::OptionalOwnedChild.is_required_child());
        assert!(Ownership::OptionalOwnedChild.is_child());
        assert!(!Ownership::ValueField.is_child());
    }

    #[test]
    fn test_ownership_serde_keywords() {
        let kind: Ownership = serde_json::from_str("\"optional\"").unwrap();
        assert_eq!(kind, Ownership::OptionalOwnedChild);
        assert_eq!(
            serde_json::to_string(&Ownership::SharedOwnedChild).unwrap(),
            "\"shared\""
        );
    }

    #[test]
    fn test_referenced_bases_skips_self_and_values() {
        let mut variants = BTreeMap::new();
        variants.insert(
            "If".to_string(),
            VariantSpec {
                name: "If".to_string(),
                fields: vec![
                    field("condition", "Expr", Ownership::ExclusiveOwnedChild),
                    field("thenBranch", "Stmt", Ownership::ExclusiveOwnedChild),
                    field("keyword", "Token", Ownership::ValueField),
                ],
            },
        );
        let base = BaseTypeSpec {
            name: "Stmt".to_string(),
            variants,
            externals: BTreeSet::new(),
            includes: BTreeMap::new(),
        };

        let referenced: Vec<_> = base.referenced_bases().into_iter().collect();
        assert_eq!(referenced, vec!["Expr"]);
    }

    #[test]
    fn test_resolve_type_falls_back_to_declared() {
        let mut schema = Schema::default();
        schema.aliases.insert(
            "Value".to_string(),
            BTreeMap::from([("cpp".to_string(), "std::any".to_string())]),
        );

        assert_eq!(schema.resolve_type("Value", "cpp"), "std::any");
        assert_eq!(schema.resolve_type("Value", "rust"), "Value");
        assert_eq!(schema.resolve_type("Token", "cpp"), "Token");
    }
}
