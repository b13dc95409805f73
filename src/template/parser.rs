//! Placeholder parser.
//!
//! Splits a template into literal text and `${path}` placeholders.

use super::{Result, TemplateError};

const OPEN: &str = "${";
const CLOSE: char = '}';

/// A node in a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text.
    Text(String),

    /// Placeholder path, e.g. `item.title`.
    Variable(String),
}

/// Template parser.
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Parse the template into nodes.
    ///
    /// Adjacent literal text, including escaped `\${`, is merged into a single
    /// [`Node::Text`].
    pub fn parse(self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        let mut rest = self.input;

        while let Some(start) = rest.find(OPEN) {
            let (before, after) = rest.split_at(start);
            let after = &after[OPEN.len()..];

            if let Some(literal) = before.strip_suffix('\\') {
                text.push_str(literal);
                text.push_str(OPEN);
                rest = after;
                continue;
            }
            text.push_str(before);

            let end = after.find(CLOSE).ok_or_else(|| {
                TemplateError::Parse(format!("unclosed placeholder near '{}'", preview(after)))
            })?;
            let path = check_path(after[..end].trim())?;

            if !text.is_empty() {
                nodes.push(Node::Text(std::mem::take(&mut text)));
            }
            nodes.push(Node::Variable(path.to_string()));
            rest = &after[end + CLOSE.len_utf8()..];
        }

        text.push_str(rest);
        if !text.is_empty() {
            nodes.push(Node::Text(text));
        }

        Ok(nodes)
    }
}

/// Accept dot-separated segments of `[A-Za-z0-9_@-]` (any alphanumeric).
fn check_path(path: &str) -> Result<&str> {
    if path.is_empty() {
        return Err(TemplateError::Parse("empty placeholder".to_string()));
    }

    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '@'))
    };

    if path.split('.').all(valid_segment) {
        Ok(path)
    } else {
        Err(TemplateError::Parse(format!("invalid placeholder path '{path}'")))
    }
}

fn preview(s: &str) -> String {
    s.chars().take(10).collect()
}
