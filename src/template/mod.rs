//! Message templates.
//!
//! Chat lines are rendered from plain-text templates with `${path}`
//! placeholders, where `path` is a dot-separated lookup into the variables of
//! a [`TemplateContext`] (`${item.title}`, `${config.messageCount.maximum}`,
//! `${list.0}`). Write `\${` for a literal `${`.
//!
//! A placeholder whose path does not resolve renders as the empty string.
//! Output is never escaped.
//!
//! ```
//! use ghfeed::template::{TemplateContext, TemplateEngine};
//!
//! let mut engine = TemplateEngine::new();
//! engine.load("greeting", "Hello, ${name}!").unwrap();
//!
//! let mut context = TemplateContext::new();
//! context.set("name", "octocat");
//!
//! assert_eq!(engine.render("greeting", &context).unwrap(), "Hello, octocat!");
//! ```

mod parser;
mod renderer;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::config::MessagesConfig;

pub use parser::{Node, Parser};
pub use renderer::Renderer;

/// Template name of the per-item message.
pub const SUCCESS: &str = "success";
/// Template name of the too-many-items error.
pub const ERROR_THRESHOLD: &str = "errors.threshold";
/// Template name of the request error.
pub const ERROR_REQUEST: &str = "errors.request";
/// Template name of the feed decode error.
pub const ERROR_FEED_PARSER: &str = "errors.feedParser";
/// Template name of the empty feed message.
pub const ERROR_NO_ITEMS: &str = "errors.noItems";

/// Template errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template registered under this name.
    #[error("unknown template '{0}'")]
    NotFound(String),

    /// The template text is malformed.
    #[error("template syntax error: {0}")]
    Parse(String),

    /// A placeholder cannot be turned into text.
    #[error("cannot render template: {0}")]
    Render(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// A template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Displayed as its items joined with `", "`.
    List(Vec<Value>),
    /// Has no text form; only its members can be rendered.
    Map(BTreeMap<String, Value>),
    /// Displayed as the empty string.
    Null,
}

impl Value {
    /// Shorthand for [`Value::Text`].
    pub fn string(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Build a [`Value::Map`] from key/value pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Follow a dot-separated path below this value.
    ///
    /// Map members are addressed by key, list items by decimal index.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |value, key| match value {
            Value::Map(members) => members.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object]"),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .unwrap_or_else(|| Value::Float(n.as_f64().unwrap_or_default())),
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(members) => Value::Map(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Variables visible to one render.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a top-level variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Resolve a placeholder path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((root, rest)) => self.variables.get(root)?.lookup(rest),
            None => self.variables.get(path),
        }
    }

    /// Copy of this context to extend without touching the original.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

/// Named, pre-parsed templates.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    templates: HashMap<String, Vec<Node>>,
}

impl TemplateEngine {
    /// Create an engine without templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine holding every message template from the configuration.
    pub fn from_messages(messages: &MessagesConfig) -> Result<Self> {
        let mut engine = Self::new();
        for (name, content) in [
            (SUCCESS, &messages.success),
            (ERROR_THRESHOLD, &messages.errors.threshold),
            (ERROR_REQUEST, &messages.errors.request),
            (ERROR_FEED_PARSER, &messages.errors.feed_parser),
            (ERROR_NO_ITEMS, &messages.errors.no_items),
        ] {
            engine
                .load(name, content)
                .map_err(|e| TemplateError::Parse(format!("{name}: {e}")))?;
        }
        Ok(engine)
    }

    /// Parse `content` and register it as `name`.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let nodes = Parser::new(content).parse()?;
        self.templates.insert(name.into(), nodes);
        Ok(())
    }

    /// Render the template registered as `name`.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Renderer::new(context).render(nodes)
    }

    /// Parse and render `content` in one go, without registering it.
    pub fn render_string(content: &str, context: &TemplateContext) -> Result<String> {
        let nodes = Parser::new(content).parse()?;
        Renderer::new(context).render(&nodes)
    }

    /// Check if a template named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}
