//! Skeleton parsing.
//!
//! A skeleton is read line by line. A line holding nothing but one
//! `{% ... %}` tag is consumed entirely, newline included. A line holding
//! nothing but one `{{ ... }}` placeholder keeps its indentation and is
//! dropped when the placeholder expands to nothing. Everywhere else tags and
//! placeholders are substituted in place.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::TemplateError;
use crate::render::Dialect;

/// A placeholder reference: `name` or `item.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub(crate) root: String,
    pub(crate) key: Option<String>,
}

impl Reference {
    fn parse(text: &str, line: usize) -> Result<Self, TemplateError> {
        let mut parts = text.split('.');
        let root = parts.next().unwrap_or_default();
        let key = parts.next();

        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid(root) || key.is_some_and(|k| !valid(k)) || parts.next().is_some() {
            return Err(TemplateError::malformed(
                line,
                format!("invalid placeholder '{}'", text),
            ));
        }

        Ok(Self {
            root: root.to_string(),
            key: key.map(str::to_string),
        })
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}.{}", self.root, key),
            None => f.write_str(&self.root),
        }
    }
}

/// A parsed skeleton node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Value {
        reference: Reference,
        line: usize,
    },
    /// A placeholder standing alone on its line.
    LineValue {
        reference: Reference,
        indent: String,
        newline: bool,
        line: usize,
    },
    For {
        var: String,
        list: String,
        body: Vec<Node>,
        line: usize,
    },
}

#[derive(Debug)]
enum Token {
    Text(String),
    Value { text: String, line: usize },
    LineValue { text: String, indent: String, newline: bool, line: usize },
    Tag { text: String, line: usize },
}

/// A parsed skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub(crate) nodes: Vec<Node>,
}

impl Skeleton {
    /// Parse skeleton text.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let tokens = tokenize(text)?;
        let nodes = build(tokens)?;
        Ok(Self { nodes })
    }

    /// Load and parse a skeleton file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded skeleton override");
        Self::parse(&text)
    }

    /// The skeleton compiled into a dialect.
    pub fn builtin(dialect: &dyn Dialect) -> Result<Self, TemplateError> {
        Self::parse(dialect.skeleton())
    }
}

/// Inner text of `trimmed` if it is exactly one `open ... close` marker.
fn standalone<'a>(trimmed: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let inner = trimmed.strip_prefix(open)?.strip_suffix(close)?;
    let nested = ["{{", "}}", "{%", "%}"].iter().any(|m| inner.contains(m));
    (!nested).then_some(inner.trim())
}

fn tokenize(text: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();

    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let line = idx + 1;
        let (body, newline) = match raw.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let trimmed = body.trim();

        if let Some(inner) = standalone(trimmed, "{%", "%}") {
            tokens.push(Token::Tag {
                text: inner.to_string(),
                line,
            });
            continue;
        }

        if let Some(inner) = standalone(trimmed, "{{", "}}") {
            let indent = &body[..body.len() - body.trim_start().len()];
            tokens.push(Token::LineValue {
                text: inner.to_string(),
                indent: indent.to_string(),
                newline,
                line,
            });
            continue;
        }

        tokenize_inline(raw, line, &mut tokens)?;
    }

    Ok(tokens)
}

fn tokenize_inline(mut rest: &str, line: usize, tokens: &mut Vec<Token>) -> Result<(), TemplateError> {
    loop {
        let next = match (rest.find("{{"), rest.find("{%")) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(start) = next else {
            if !rest.is_empty() {
                tokens.push(Token::Text(rest.to_string()));
            }
            return Ok(());
        };

        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }

        let is_tag = rest[start..].starts_with("{%");
        let close = if is_tag { "%}" } else { "}}" };
        let after = &rest[start + 2..];
        let end = after.find(close).ok_or_else(|| {
            TemplateError::malformed(line, format!("unterminated '{}'", &rest[start..start + 2]))
        })?;

        let text = after[..end].trim().to_string();
        tokens.push(if is_tag {
            Token::Tag { text, line }
        } else {
            Token::Value { text, line }
        });
        rest = &after[end + 2..];
    }
}

struct Frame {
    var: String,
    list: String,
    line: usize,
    body: Vec<Node>,
}

fn build(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        let node = match token {
            Token::Text(text) => Node::Text(text),
            Token::Value { text, line } => Node::Value {
                reference: Reference::parse(&text, line)?,
                line,
            },
            Token::LineValue {
                text,
                indent,
                newline,
                line,
            } => Node::LineValue {
                reference: Reference::parse(&text, line)?,
                indent,
                newline,
                line,
            },
            Token::Tag { text, line } => {
                let words: Vec<&str> = text.split_whitespace().collect();
                match words.as_slice() {
                    ["endfor"] => {
                        let frame = stack.pop().ok_or_else(|| {
                            TemplateError::malformed(line, "'endfor' without a matching 'for'")
                        })?;
                        Node::For {
                            var: frame.var,
                            list: frame.list,
                            body: frame.body,
                            line: frame.line,
                        }
                    }
                    ["for", var, "in", list] => {
                        if stack.iter().any(|f| f.list == *list) {
                            return Err(TemplateError::malformed(
                                line,
                                format!("list '{}' is already being iterated", list),
                            ));
                        }
                        if stack.iter().any(|f| f.var == *var) {
                            return Err(TemplateError::malformed(
                                line,
                                format!("loop variable '{}' shadows an enclosing loop", var),
                            ));
                        }
                        stack.push(Frame {
                            var: var.to_string(),
                            list: list.to_string(),
                            line,
                            body: Vec::new(),
                        });
                        continue;
                    }
                    ["for", ..] => {
                        return Err(TemplateError::malformed(
                            line,
                            "expected 'for <item> in <list>'",
                        ));
                    }
                    _ => {
                        return Err(TemplateError::UnknownTag {
                            tag: words.first().copied().unwrap_or_default().to_string(),
                            line,
                        });
                    }
                }
            }
        };

        match stack.last_mut() {
            Some(frame) => frame.body.push(node),
            None => root.push(node),
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(TemplateError::malformed(
            frame.line,
            format!("'for {} in {}' is never closed", frame.var, frame.list),
        ));
    }

    Ok(root)
}
