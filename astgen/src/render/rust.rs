//! Rust module dialect.
//!
//! Nodes of a base type live in an arena and refer to each other through
//! typed ids, and the base type is an enum over its variant structs. A
//! required child is stored as a plain id, which cannot be absent, so no
//! runtime presence check is generated for it; an optional child is the only
//! place an `Option` appears.

use convert_case::{Case, Casing};
use std::collections::BTreeMap;

use super::dialect::{Dialect, Part};
use super::{FieldView, RenderedVariant, bind_predicate};
use crate::schema::Ownership;

const SKELETON: &str = include_str!("../template/skeletons/rust.rs.tmpl");

// Keywords that cannot be written as raw identifiers.
const UNESCAPABLE: &[&str] = &["self", "Self", "super", "crate"];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Rust module output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustDialect;

impl RustDialect {
    fn element_type(field: &FieldView<'_>) -> String {
        if field.spec.ownership().is_child() {
            format!("{}Id", field.ty)
        } else {
            field.ty.clone()
        }
    }

    fn storage_type(field: &FieldView<'_>) -> String {
        let element = Self::element_type(field);
        if field.spec.is_repeated() {
            format!("Vec<{}>", element)
        } else if field.spec.ownership() == Ownership::OptionalOwnedChild {
            format!("Option<{}>", element)
        } else {
            element
        }
    }
}

impl Dialect for RustDialect {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn name(&self) -> &'static str {
        "Rust module"
    }

    fn file_name(&self, base: &str) -> String {
        format!("{}.rs", base.to_case(Case::Snake))
    }

    fn skeleton(&self) -> &'static str {
        SKELETON
    }

    fn is_reserved(&self, name: &str) -> bool {
        UNESCAPABLE.contains(&name) || KEYWORDS.contains(&name)
    }

    fn generated_methods(&self) -> &'static [&'static str] {
        &["new"]
    }

    fn members_share_method_scope(&self) -> bool {
        false
    }

    fn shared_type_namespace(&self) -> bool {
        false
    }

    fn default_accessor_prefix(&self) -> &'static str {
        ""
    }

    fn accessor_name(&self, prefix: &str, field: &str) -> String {
        let snake = field.to_case(Case::Snake);
        if prefix.is_empty() {
            escape_keyword(snake)
        } else {
            format!("{}_{}", prefix.to_case(Case::Snake), snake)
        }
    }

    fn field_ident(&self, field: &str) -> String {
        escape_keyword(field.to_case(Case::Snake))
    }

    fn base_include(&self, base: &str) -> String {
        format!("super::{}::{}Id", base.to_case(Case::Snake), base)
    }

    fn separator(&self, part: Part) -> &'static str {
        match part {
            Part::Params | Part::Initializers => ", ",
            Part::Members | Part::Checks => "\n",
            Part::Accessors => "\n\n",
        }
    }

    fn param(&self, field: &FieldView<'_>) -> String {
        format!("{}: {}", field.ident, Self::storage_type(field))
    }

    fn initializer(&self, field: &FieldView<'_>) -> String {
        field.ident.clone()
    }

    fn member(&self, field: &FieldView<'_>) -> String {
        format!("    {}: {},", field.ident, Self::storage_type(field))
    }

    fn ownership_check(&self, _variant: &str, _field: &FieldView<'_>) -> Option<String> {
        None
    }

    fn predicate_check(&self, variant: &str, field: &FieldView<'_>, predicate: &str) -> String {
        let stored = format!("node.{}", field.ident);
        format!(
            "        assert!({}, \"{}: check failed for `{}`\");",
            bind_predicate(predicate, &stored),
            variant,
            field.ident
        )
    }

    fn accessor(&self, field: &FieldView<'_>) -> String {
        let name = &field.accessor;
        let ident = &field.ident;
        let element = Self::element_type(field);

        let (ret, body) = if field.spec.is_repeated() {
            (format!("&[{}]", element), format!("&self.{}", ident))
        } else {
            match field.spec.ownership() {
                Ownership::ExclusiveOwnedChild | Ownership::SharedOwnedChild => {
                    (element, format!("self.{}", ident))
                }
                Ownership::OptionalOwnedChild => {
                    (format!("Option<{}>", element), format!("self.{}", ident))
                }
                Ownership::ValueField => (format!("&{}", element), format!("&self.{}", ident)),
            }
        };

        format!(
            "    pub fn {}(&self) -> {} {{\n        {}\n    }}",
            name, ret, body
        )
    }

    fn variant_bindings(&self, variant: &RenderedVariant, out: &mut BTreeMap<String, String>) {
        let init = format!(
            "Self {{ {} }}",
            variant.initializers.join(self.separator(Part::Initializers))
        );
        let body = if variant.checks.is_empty() {
            format!("        {}", init)
        } else {
            format!(
                "        let node = {};\n{}\n        node",
                init,
                variant.checks.join(self.separator(Part::Checks))
            )
        };
        out.insert("init".to_string(), init);
        out.insert("body".to_string(), body);
    }
}

/// Prefix a keyword with `r#` so it can be used as an identifier.
fn escape_keyword(ident: String) -> String {
    if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{}", ident)
    } else {
        ident
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn spec(name: &str, ty: &str, ownership: Ownership, repeated: bool) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            ty: ty.to_string(),
            ownership,
            repeated,
            check: None,
        }
    }

    fn view(spec: &FieldSpec) -> FieldView<'_> {
        FieldView {
            spec,
            ident: RustDialect.field_ident(spec.name()),
            ty: spec.ty().to_string(),
            accessor: RustDialect.accessor_name("", spec.name()),
        }
    }

    #[test]
    fn test_required_child_is_an_id() {
        let spec = spec("thenBranch", "Stmt", Ownership::ExclusiveOwnedChild, false);
        let field = view(&spec);

        assert_eq!(RustDialect.param(&field), "then_branch: StmtId");
        assert_eq!(RustDialect.member(&field), "    then_branch: StmtId,");
        assert!(RustDialect.ownership_check("If", &field).is_none());
        assert_eq!(
            RustDialect.accessor(&field),
            "    pub fn then_branch(&self) -> StmtId {\n        self.then_branch\n    }"
        );
    }

    #[test]
    fn test_optional_child_is_the_only_option() {
        let optional = spec("elseBranch", "Stmt", Ownership::OptionalOwnedChild, false);
        assert_eq!(RustDialect.param(&view(&optional)), "else_branch: Option<StmtId>");

        let shared = spec("superclass", "Expr", Ownership::SharedOwnedChild, false);
        assert_eq!(RustDialect.param(&view(&shared)), "superclass: ExprId");
    }

    #[test]
    fn test_repeated_fields_are_slices() {
        let children = spec("arguments", "Expr", Ownership::ExclusiveOwnedChild, true);
        let field = view(&children);
        assert_eq!(RustDialect.param(&field), "arguments: Vec<ExprId>");
        assert!(RustDialect.accessor(&field).contains("-> &[ExprId]"));

        let values = spec("params", "Token", Ownership::ValueField, true);
        assert!(RustDialect.accessor(&view(&values)).contains("-> &[Token]"));
    }

    #[test]
    fn test_value_accessor_borrows() {
        let spec = spec("op", "Token", Ownership::ValueField, false);
        assert_eq!(
            RustDialect.accessor(&view(&spec)),
            "    pub fn op(&self) -> &Token {\n        &self.op\n    }"
        );
    }

    #[test]
    fn test_keywords_are_escaped() {
        assert_eq!(RustDialect.field_ident("type"), "r#type");
        assert_eq!(RustDialect.accessor_name("", "type"), "r#type");
        assert_eq!(RustDialect.accessor_name("get", "type"), "get_type");
        assert_eq!(RustDialect.field_ident("value"), "value");
    }

    #[test]
    fn test_reserved_names() {
        assert!(RustDialect.is_reserved("self"));
        assert!(RustDialect.is_reserved("match"));
        assert!(!RustDialect.is_reserved(&RustDialect.field_ident("match")));
        assert!(RustDialect.is_reserved(&RustDialect.field_ident("Self")));
        assert!(!RustDialect.is_reserved("Binary"));
    }

    #[test]
    fn test_body_with_and_without_checks() {
        let mut variant = RenderedVariant {
            name: "Variable".to_string(),
            params: vec!["name: Token".to_string()],
            initializers: vec!["name".to_string()],
            members: vec!["    name: Token,".to_string()],
            checks: vec![],
            accessors: vec![],
        };

        let mut out = BTreeMap::new();
        RustDialect.variant_bindings(&variant, &mut out);
        assert_eq!(out["body"], "        Self { name }");

        variant
            .checks
            .push("        assert!(node.name.is_identifier(), \"Variable: check failed for `name`\");".to_string());
        RustDialect.variant_bindings(&variant, &mut out);
        assert!(out["body"].starts_with("        let node = Self { name };\n"));
        assert!(out["body"].ends_with("\n        node"));
    }

    #[test]
    fn test_predicate_check() {
        let spec = spec("name", "Token", Ownership::ValueField, false);
        let check = RustDialect.predicate_check("Variable", &view(&spec), "$.is_identifier()");
        assert_eq!(
            check,
            "        assert!(node.name.is_identifier(), \"Variable: check failed for `name`\");"
        );
    }
}
