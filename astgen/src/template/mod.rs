//! Skeleton substitution.
//!
//! The engine fills a [`Skeleton`] from a [`TemplateContext`]: global values
//! referenced as `{{ name }}` and lists iterated with
//! `{% for item in list %}`, whose items are referenced as `{{ item.key }}`.
//! Output depends only on the skeleton and the context.

mod skeleton;

use std::collections::BTreeMap;

use crate::error::TemplateError;
use crate::render::Bindings;
use skeleton::{Node, Reference};

pub use skeleton::Skeleton;

/// Values available to a skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
    lists: BTreeMap<String, Vec<Bindings>>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a list.
    pub fn with_list(mut self, name: impl Into<String>, items: Vec<Bindings>) -> Self {
        self.lists.insert(name.into(), items);
        self
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn list(&self, name: &str) -> Option<&[Bindings]> {
        self.lists.get(name).map(Vec::as_slice)
    }
}

/// Renders skeletons.
pub struct TemplateEngine;

type Scope<'a> = (&'a str, &'a Bindings);

impl TemplateEngine {
    /// Substitute a context into a skeleton.
    pub fn render(skeleton: &Skeleton, context: &TemplateContext) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut scopes = Vec::new();
        render_nodes(&skeleton.nodes, context, &mut scopes, &mut out)?;
        Ok(out)
    }
}

fn render_nodes<'a>(
    nodes: &'a [Node],
    context: &'a TemplateContext,
    scopes: &mut Vec<Scope<'a>>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Value { reference, line } => {
                out.push_str(lookup(reference, *line, context, scopes)?);
            }
            Node::LineValue {
                reference,
                indent,
                newline,
                line,
            } => {
                let value = lookup(reference, *line, context, scopes)?;
                if !value.is_empty() {
                    out.push_str(indent);
                    out.push_str(value);
                    if *newline {
                        out.push('\n');
                    }
                }
            }
            Node::For {
                var,
                list,
                body,
                line,
            } => {
                let items = context.list(list).ok_or_else(|| TemplateError::UnknownList {
                    name: list.clone(),
                    line: *line,
                })?;
                for item in items {
                    scopes.push((var.as_str(), item));
                    render_nodes(body, context, scopes, out)?;
                    scopes.pop();
                }
            }
        }
    }
    Ok(())
}

fn lookup<'a>(
    reference: &Reference,
    line: usize,
    context: &'a TemplateContext,
    scopes: &[Scope<'a>],
) -> Result<&'a str, TemplateError> {
    let found = match &reference.key {
        Some(key) => scopes
            .iter()
            .rev()
            .find(|(var, _)| *var == reference.root)
            .and_then(|&(_, item)| item.get(key))
            .map(String::as_str),
        None => context.value(&reference.root),
    };

    found.ok_or_else(|| TemplateError::UnknownPlaceholder {
        name: reference.to_string(),
        line,
    })
}
