//! Target dialect trait definition.
//!
//! A dialect knows how to spell one field of a node in a particular
//! type-definition style. The [`Renderer`](super::Renderer) walks the schema
//! and asks the dialect for each piece; the dialect's skeleton arranges the
//! pieces into a file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::cpp::CppDialect;
use super::rust::RustDialect;
use super::{FieldView, RenderedVariant};

/// Which pieces of a variant a separator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Params,
    Initializers,
    Members,
    Checks,
    Accessors,
}

/// Trait for target type-definition styles.
///
/// Every method is a pure function of its arguments, which is what keeps
/// rendering deterministic.
pub trait Dialect: Send + Sync {
    /// Short identifier used in configuration, schema include tables and
    /// alias tables (e.g. "cpp").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Output file name for a base type.
    fn file_name(&self, base: &str) -> String;

    /// Built-in skeleton text.
    fn skeleton(&self) -> &'static str;

    /// Whether a name cannot be used as a type name or, once passed through
    /// [`Dialect::field_ident`], as a member name.
    fn is_reserved(&self, name: &str) -> bool;

    /// Methods every generated variant defines; accessors may not reuse them.
    fn generated_methods(&self) -> &'static [&'static str];

    /// Whether a variant's members and methods share one scope.
    fn members_share_method_scope(&self) -> bool;

    /// Whether every generated type lands in one namespace, so variant names
    /// must be unique across base types.
    fn shared_type_namespace(&self) -> bool;

    /// Accessor prefix used when none is configured.
    fn default_accessor_prefix(&self) -> &'static str;

    /// Accessor method name for a field.
    fn accessor_name(&self, prefix: &str, field: &str) -> String;

    /// Identifier used for the parameter and the member storing a field.
    fn field_ident(&self, field: &str) -> String;

    /// Include emitted for another base type generated in the same run.
    fn base_include(&self, base: &str) -> String;

    /// Separator placed between the rendered pieces of one kind.
    fn separator(&self, part: Part) -> &'static str;

    /// Constructor parameter.
    fn param(&self, field: &FieldView<'_>) -> String;

    /// Transfer of a constructor parameter into node storage.
    fn initializer(&self, field: &FieldView<'_>) -> String;

    /// Member declaration.
    fn member(&self, field: &FieldView<'_>) -> String;

    /// Construction-time rejection of an absent required child.
    ///
    /// Returns `None` when the dialect's storage cannot represent absence.
    fn ownership_check(&self, variant: &str, field: &FieldView<'_>) -> Option<String>;

    /// Construction-time evaluation of an author predicate.
    fn predicate_check(&self, variant: &str, field: &FieldView<'_>, predicate: &str) -> String;

    /// Read-only accessor.
    fn accessor(&self, field: &FieldView<'_>) -> String;

    /// Dialect-specific template values for a variant block.
    fn variant_bindings(&self, variant: &RenderedVariant, out: &mut BTreeMap<String, String>);
}

/// The built-in dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// C++17 header with `std::unique_ptr` and `std::shared_ptr` children.
    #[default]
    Cpp,

    /// Rust module with an arena and typed node ids.
    Rust,
}

static CPP: CppDialect = CppDialect;
static RUST: RustDialect = RustDialect;

impl DialectKind {
    /// All built-in dialects.
    pub const ALL: [DialectKind; 2] = [DialectKind::Cpp, DialectKind::Rust];

    /// The dialect implementation.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Cpp => &CPP,
            DialectKind::Rust => &RUST,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.dialect().id()
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown dialect '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(DialectKind::as_str).join(", ")
                )
            })
    }
}
