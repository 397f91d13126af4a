//! The runtime value model.
//!
//! Values are immutable and cheap to clone: lists and contexts are
//! persistent `im` collections, so pushing a scope or binding a block
//! param never copies the data it points into.

use std::fmt;

use im::{OrdMap, Vector};

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A missing key, an absent argument, or a `null`/`undefined` literal.
    #[default]
    Undefined,
    Integer(i64),
    Number(f64),
    String(String),
    Bool(bool),
    List(Vector<Value>),
    /// A string-keyed record; iteration order is key order.
    Context(OrdMap<String, Value>),
}

/// The kind of a `Value`, used in error messages and kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Integer,
    Number,
    String,
    Bool,
    List,
    Context,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Undefined => "undefined",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Bool => "boolean",
            Kind::List => "list",
            Kind::Context => "context",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Build a context from key/value pairs.
    pub fn context<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Context(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list from values.
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Integer(_) => Kind::Integer,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Bool(_) => Kind::Bool,
            Value::List(_) => Kind::List,
            Value::Context(_) => Kind::Context,
        }
    }

    /// Handlebars truthiness: `false`, undefined, `""`, zero and the empty
    /// list are falsy. Every context is truthy, even an empty one.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Integer(n) => *n != 0,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Context(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// A direct child: a context key, or a list index written as digits.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Context(map) => map.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Follow a chain of keys. A missing key anywhere yields `Undefined`.
    pub fn lookup(&self, segments: &[String]) -> Value {
        let mut current = self;
        for segment in segments {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Value::Undefined,
            }
        }
        current.clone()
    }

    /// The text a mustache prints for this value, or `None` for the kinds
    /// that refuse to print (undefined, lists and contexts).
    pub fn to_output(&self) -> Option<String> {
        match self {
            Value::Integer(n) => Some(n.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Undefined | Value::List(_) | Value::Context(_) => None,
        }
    }

    /// Short description for error messages, e.g. `string "x"` or `list`.
    pub fn describe(&self) -> String {
        match self {
            Value::String(s) => format!("string {s:?}"),
            Value::Integer(_) | Value::Number(_) | Value::Bool(_) => {
                format!("{} `{}`", self.kind(), self.to_output().unwrap_or_default())
            }
            other => other.kind().to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into_iter().collect())
    }
}
