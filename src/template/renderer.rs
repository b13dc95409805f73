//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Variable(path) => output.push_str(&self.render_variable(path)?),
            }
        }

        Ok(output)
    }

    /// Render a variable reference.
    ///
    /// Missing paths render as the empty string. A path that resolves to an
    /// object has no plain-text form and is an error.
    fn render_variable(&self, path: &str) -> Result<String> {
        match self.context.get(path) {
            Some(Value::Map(_)) => Err(TemplateError::Render(format!(
                "'{path}' is an object, not a value"
            ))),
            Some(value) => Ok(value.to_string()),
            None => Ok(String::new()),
        }
    }
}
