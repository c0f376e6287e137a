//! Declarative schema input.
//!
//! These types mirror the on-disk schema format one to one. Unknown keys are
//! rejected so that a malformed declaration fails loudly instead of being
//! reinterpreted.
//!
//! ```toml
//! [aliases]
//! Value = { cpp = "std::any", rust = "Value" }
//!
//! [[base]]
//! name = "Expr"
//! includes = { cpp = ["Token.h"], rust = ["crate::token::Token"] }
//!
//! [[base.variant]]
//! name = "Binary"
//! fields = [
//!     { name = "left", type = "Expr", kind = "exclusive" },
//!     { name = "operator", type = "Token", kind = "value" },
//!     { name = "right", type = "Expr", kind = "exclusive" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::Ownership;
use crate::error::SchemaError;

/// A schema as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    /// Value type aliases: alias name to per-dialect type expression.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, BTreeMap<String, String>>,

    /// Base types in authoring order.
    #[serde(default, rename = "base")]
    pub bases: Vec<BaseDecl>,
}

/// A base type as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseDecl {
    pub name: String,

    /// Base types generated elsewhere that fields may reference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub externals: Vec<String>,

    /// Extra includes per dialect id, emitted verbatim in the preamble.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub includes: BTreeMap<String, Vec<String>>,

    /// Variants in authoring order.
    #[serde(default, rename = "variant")]
    pub variants: Vec<VariantDecl>,
}

/// A variant as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantDecl {
    pub name: String,

    /// Fields in constructor parameter order.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// A field as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    pub kind: Ownership,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl SchemaDecl {
    /// Create an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a declaration from a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::parse_toml(&content, &origin),
            Some("json") => Self::parse_json(&content, &origin),
            _ => Err(SchemaError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse a TOML declaration.
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        Self::parse_toml(content, "<inline>")
    }

    /// Parse a JSON declaration.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Self::parse_json(content, "<inline>")
    }

    fn parse_toml(content: &str, origin: &str) -> Result<Self, SchemaError> {
        toml::from_str(content).map_err(|e| SchemaError::parse(origin, e.message()))
    }

    fn parse_json(content: &str, origin: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(content).map_err(|e| SchemaError::parse(origin, e.to_string()))
    }

    /// Add a base type.
    pub fn with_base(mut self, base: BaseDecl) -> Self {
        self.bases.push(base);
        self
    }

    /// Add a value type alias for one dialect.
    pub fn with_alias(
        mut self,
        name: impl Into<String>,
        dialect: impl Into<String>,
        ty: impl Into<String>,
    ) -> Self {
        self.aliases
            .entry(name.into())
            .or_default()
            .insert(dialect.into(), ty.into());
        self
    }
}

impl BaseDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            externals: Vec::new(),
            includes: BTreeMap::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: VariantDecl) -> Self {
        self.variants.push(variant);
        self
    }

    /// Declare a base type generated outside this run.
    pub fn with_external(mut self, name: impl Into<String>) -> Self {
        self.externals.push(name.into());
        self
    }

    /// Add an include for one dialect.
    pub fn with_include(mut self, dialect: impl Into<String>, include: impl Into<String>) -> Self {
        self.includes
            .entry(dialect.into())
            .or_default()
            .push(include.into());
        self
    }
}

impl VariantDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, kind: Ownership) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            kind,
            repeated: false,
            check: None,
        }
    }

    pub fn exclusive(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, ty, Ownership::ExclusiveOwnedChild)
    }

    pub fn optional(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, ty, Ownership::OptionalOwnedChild)
    }

    pub fn shared(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, ty, Ownership::SharedOwnedChild)
    }

    pub fn value(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, ty, Ownership::ValueField)
    }

    /// Mark the field as a sequence.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Attach a semantic predicate.
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINARY_TOML: &str = r#"
[aliases]
Value = { cpp = "std::any", rust = "Value" }

[[base]]
name = "Expr"
includes = { cpp = ["Token.h"] }

[[base.variant]]
name = "Binary"
fields = [
    { name = "left", type = "Expr", kind = "exclusive" },
    { name = "operator", type = "Token", kind = "value" },
    { name = "right", type = "Expr", kind = "exclusive" },
]

[[base.variant]]
name = "Call"
fields = [
    { name = "callee", type = "Expr", kind = "exclusive" },
    { name = "arguments", type = "Expr", kind = "exclusive", repeated = true },
]
"#;

    #[test]
    fn test_parse_toml() {
        let decl = SchemaDecl::from_toml_str(BINARY_TOML).unwrap();

        assert_eq!(decl.bases.len(), 1);
        let base = &decl.bases[0];
        assert_eq!(base.name, "Expr");
        assert_eq!(base.includes["cpp"], vec!["Token.h".to_string()]);
        assert_eq!(base.variants.len(), 2);
        assert_eq!(base.variants[0].fields[1].kind, Ownership::ValueField);
        assert!(base.variants[1].fields[1].repeated);
        assert_eq!(decl.aliases["Value"]["cpp"], "std::any");
    }

    #[test]
    fn test_parse_json_matches_builder() {
        let json = r#"{
            "base": [{
                "name": "Expr",
                "variant": [{
                    "name": "Literal",
                    "fields": [{ "name": "value", "type": "Value", "kind": "value" }]
                }]
            }]
        }"#;

        let parsed = SchemaDecl::from_json_str(json).unwrap();
        let built = SchemaDecl::new().with_base(
            BaseDecl::new("Expr")
                .with_variant(VariantDecl::new("Literal").with_field(FieldDecl::value("value", "Value"))),
        );
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let toml = r#"
[[base]]
name = "Expr"

[[base.variant]]
name = "Grouping"
fields = [{ name = "expr", type = "Expr", kind = "exclusive", owned = true }]
"#;
        let err = SchemaDecl::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
        assert!(err.to_string().contains("owned"));
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let toml = r#"
[[base]]
name = "Expr"

[[base.variant]]
name = "Grouping"
fields = [{ name = "expr", type = "Expr" }]
"#;
        assert!(SchemaDecl::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let toml = r#"
[[base]]
name = "Expr"

[[base.variant]]
name = "Grouping"
fields = [{ name = "expr", type = "Expr", kind = "borrowed" }]
"#;
        assert!(SchemaDecl::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "base: []").unwrap();

        let err = SchemaDecl::from_path(&path).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SchemaDecl::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }

    #[test]
    fn test_from_path_reports_origin() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[[base]]\nname = 3\n").unwrap();

        let err = SchemaDecl::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
