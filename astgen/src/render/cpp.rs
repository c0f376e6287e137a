//! C++ header dialect.
//!
//! Each variant becomes a struct deriving from the base type with a visitor
//! `accept` override. Children are held in `std::unique_ptr` (or
//! `std::shared_ptr` for shared children) and handed over by value, so the
//! caller's handle is moved from. Required children are null-checked in the
//! constructor body and rejected with `std::invalid_argument`.

use std::collections::BTreeMap;

use super::dialect::{Dialect, Part};
use super::{FieldView, RenderedVariant, accessor_name, bind_predicate};
use crate::schema::Ownership;

const SKELETON: &str = include_str!("../template/skeletons/cpp.h.tmpl");

const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "class", "compl", "const", "constexpr", "const_cast", "continue",
    "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum", "explicit",
    "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "long",
    "mutable", "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or",
    "or_eq", "private", "protected", "public", "register", "reinterpret_cast", "return", "short",
    "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch", "template",
    "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

/// C++17 header output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppDialect;

impl CppDialect {
    fn element_type(field: &FieldView<'_>) -> String {
        match field.spec.ownership() {
            Ownership::ExclusiveOwnedChild | Ownership::OptionalOwnedChild => {
                format!("std::unique_ptr<{}>", field.ty)
            }
            Ownership::SharedOwnedChild => format!("std::shared_ptr<{}>", field.ty),
            Ownership::ValueField => field.ty.clone(),
        }
    }

    fn storage_type(field: &FieldView<'_>) -> String {
        let element = Self::element_type(field);
        if field.spec.is_repeated() {
            format!("std::vector<{}>", element)
        } else {
            element
        }
    }
}

impl Dialect for CppDialect {
    fn id(&self) -> &'static str {
        "cpp"
    }

    fn name(&self) -> &'static str {
        "C++ header"
    }

    fn file_name(&self, base: &str) -> String {
        format!("{}.h", base)
    }

    fn skeleton(&self) -> &'static str {
        SKELETON
    }

    fn is_reserved(&self, name: &str) -> bool {
        RESERVED.contains(&name)
    }

    fn generated_methods(&self) -> &'static [&'static str] {
        &["accept"]
    }

    fn members_share_method_scope(&self) -> bool {
        true
    }

    fn shared_type_namespace(&self) -> bool {
        true
    }

    fn default_accessor_prefix(&self) -> &'static str {
        "get"
    }

    fn accessor_name(&self, prefix: &str, field: &str) -> String {
        escape_keyword(accessor_name(prefix, field))
    }

    fn field_ident(&self, field: &str) -> String {
        escape_keyword(field.to_string())
    }

    fn base_include(&self, base: &str) -> String {
        self.file_name(base)
    }

    fn separator(&self, part: Part) -> &'static str {
        match part {
            Part::Params | Part::Initializers => ", ",
            Part::Members | Part::Checks | Part::Accessors => "\n",
        }
    }

    fn param(&self, field: &FieldView<'_>) -> String {
        format!("{} {}", Self::storage_type(field), field.ident)
    }

    fn initializer(&self, field: &FieldView<'_>) -> String {
        format!("{0}(std::move({0}))", field.ident)
    }

    fn member(&self, field: &FieldView<'_>) -> String {
        format!("    {} {};", Self::storage_type(field), field.ident)
    }

    fn ownership_check(&self, variant: &str, field: &FieldView<'_>) -> Option<String> {
        let check = if field.spec.is_repeated() {
            format!(
                "      for (const auto& item : this->{0}) {{ if (item == nullptr) {{ \
                 throw std::invalid_argument(\"{1}: '{0}' must not contain null\"); }} }}",
                field.ident, variant
            )
        } else {
            format!(
                "      if (this->{0} == nullptr) {{ \
                 throw std::invalid_argument(\"{1}: '{0}' must not be null\"); }}",
                field.ident, variant
            )
        };
        Some(check)
    }

    fn predicate_check(&self, variant: &str, field: &FieldView<'_>, predicate: &str) -> String {
        let stored = format!("this->{}", field.ident);
        format!(
            "      if (!({})) {{ throw std::invalid_argument(\"{}: check failed for '{}': {}\"); }}",
            bind_predicate(predicate, &stored),
            variant,
            field.ident,
            escape_string(predicate)
        )
    }

    fn accessor(&self, field: &FieldView<'_>) -> String {
        let name = &field.accessor;
        let ident = &field.ident;

        if field.spec.is_repeated() {
            return format!(
                "    const {}& {}() const {{ return {}; }}",
                Self::storage_type(field),
                name,
                ident
            );
        }

        match field.spec.ownership() {
            Ownership::ExclusiveOwnedChild | Ownership::SharedOwnedChild => format!(
                "    const {}& {}() const {{ return *{}; }}",
                field.ty, name, ident
            ),
            Ownership::OptionalOwnedChild => format!(
                "    std::optional<std::reference_wrapper<const {0}>> {1}() const \
                 {{ if ({2}) {{ return std::cref(*{2}); }} return std::nullopt; }}",
                field.ty, name, ident
            ),
            Ownership::ValueField => format!(
                "    const {}& {}() const {{ return {}; }}",
                field.ty, name, ident
            ),
        }
    }

    fn variant_bindings(&self, variant: &RenderedVariant, out: &mut BTreeMap<String, String>) {
        let init = if variant.initializers.is_empty() {
            String::new()
        } else {
            format!(
                "\n        : {}",
                variant.initializers.join(self.separator(Part::Initializers))
            )
        };
        out.insert("init".to_string(), init);
    }
}

/// Append `_` to a keyword so it can name a member or method.
fn escape_keyword(ident: String) -> String {
    if RESERVED.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Escape text for a C++ string literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn view<'a>(spec: &'a FieldSpec, ty: &str) -> FieldView<'a> {
        FieldView {
            spec,
            ident: spec.name().to_string(),
            ty: ty.to_string(),
            accessor: accessor_name("get", spec.name()),
        }
    }

    fn spec(name: &str, ty: &str, ownership: Ownership, repeated: bool) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            ty: ty.to_string(),
            ownership,
            repeated,
            check: None,
        }
    }

    #[test]
    fn test_exclusive_child() {
        let spec = spec("left", "Expr", Ownership::ExclusiveOwnedChild, false);
        let field = view(&spec, "Expr");

        assert_eq!(CppDialect.param(&field), "std::unique_ptr<Expr> left");
        assert_eq!(CppDialect.initializer(&field), "left(std::move(left))");
        assert_eq!(CppDialect.member(&field), "    std::unique_ptr<Expr> left;");
        assert_eq!(
            CppDialect.accessor(&field),
            "    const Expr& getLeft() const { return *left; }"
        );
        let check = CppDialect.ownership_check("Binary", &field).unwrap();
        assert!(check.contains("if (this->left == nullptr)"));
        assert!(check.contains("Binary: 'left' must not be null"));
    }

    #[test]
    fn test_optional_child_accessor_is_presence_checked() {
        let spec = spec("elseBranch", "Stmt", Ownership::OptionalOwnedChild, false);
        let field = view(&spec, "Stmt");

        let accessor = CppDialect.accessor(&field);
        assert!(accessor.starts_with(
            "    std::optional<std::reference_wrapper<const Stmt>> getElseBranch() const"
        ));
        assert!(accessor.contains("return std::nullopt;"));
    }

    #[test]
    fn test_shared_child() {
        let spec = spec("superclass", "Expr", Ownership::SharedOwnedChild, false);
        let field = view(&spec, "Expr");
        assert_eq!(CppDialect.param(&field), "std::shared_ptr<Expr> superclass");
    }

    #[test]
    fn test_repeated_child() {
        let spec = spec("statements", "Stmt", Ownership::ExclusiveOwnedChild, true);
        let field = view(&spec, "Stmt");

        assert_eq!(
            CppDialect.param(&field),
            "std::vector<std::unique_ptr<Stmt>> statements"
        );
        assert_eq!(
            CppDialect.accessor(&field),
            "    const std::vector<std::unique_ptr<Stmt>>& getStatements() const { return statements; }"
        );
        let check = CppDialect.ownership_check("Block", &field).unwrap();
        assert!(check.contains("for (const auto& item : this->statements)"));
    }

    #[test]
    fn test_value_field() {
        let spec = spec("value", "Value", Ownership::ValueField, false);
        let field = view(&spec, "std::any");

        assert_eq!(CppDialect.param(&field), "std::any value");
        assert_eq!(
            CppDialect.accessor(&field),
            "    const std::any& getValue() const { return value; }"
        );
    }

    #[test]
    fn test_predicate_check_binds_stored_value() {
        let spec = spec("name", "Token", Ownership::ValueField, false);
        let field = view(&spec, "Token");

        let check =
            CppDialect.predicate_check("Var", &field, "$.getType() == TokenType::IDENTIFIER");
        assert!(check.contains("if (!(this->name.getType() == TokenType::IDENTIFIER))"));
        assert!(check.contains("check failed for 'name'"));
    }

    #[test]
    fn test_predicate_message_is_escaped() {
        let spec = spec("name", "Token", Ownership::ValueField, false);
        let field = view(&spec, "Token");

        let check = CppDialect.predicate_check("Var", &field, "$.lexeme != \"init\"");
        assert!(check.contains(r#"$.lexeme != \"init\""#));
    }

    #[test]
    fn test_init_binding_empty_without_fields() {
        let variant = RenderedVariant {
            name: "Nil".to_string(),
            params: vec![],
            initializers: vec![],
            members: vec![],
            checks: vec![],
            accessors: vec![],
        };
        let mut out = BTreeMap::new();
        CppDialect.variant_bindings(&variant, &mut out);
        assert_eq!(out["init"], "");
    }

    #[test]
    fn test_keyword_fields_are_escaped() {
        assert!(CppDialect.is_reserved("operator"));
        assert!(!CppDialect.is_reserved("op"));

        assert_eq!(CppDialect.field_ident("operator"), "operator_");
        assert!(!CppDialect.is_reserved(&CppDialect.field_ident("operator")));
        assert_eq!(CppDialect.accessor_name("get", "operator"), "getOperator");
        assert_eq!(CppDialect.accessor_name("", "class"), "class_");
        assert_eq!(CppDialect.field_ident("left"), "left");
    }

    #[test]
    fn test_escaped_field_is_stored_and_checked_by_its_escaped_name() {
        let spec = spec("operator", "Token", Ownership::ValueField, false);
        let field = FieldView {
            spec: &spec,
            ident: CppDialect.field_ident("operator"),
            ty: "Token".to_string(),
            accessor: CppDialect.accessor_name("get", "operator"),
        };

        assert_eq!(CppDialect.param(&field), "Token operator_");
        assert_eq!(CppDialect.initializer(&field), "operator_(std::move(operator_))");
        assert_eq!(
            CppDialect.accessor(&field),
            "    const Token& getOperator() const { return operator_; }"
        );
        let check = CppDialect.predicate_check("Unary", &field, "$.isOperator()");
        assert!(check.contains("this->operator_.isOperator()"));
    }
}
