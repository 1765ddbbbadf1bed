//! Attribute extraction from statement text and bound arguments.
//!
//! Extractors are called by the host before it opens a measurement; their
//! output is passed to [`MethodRecorder::record`](crate::recorder::MethodRecorder::record)
//! as ordinary labels. The recorder never calls an extractor itself.

use std::fmt;

use chrono::{DateTime, Utc};
use opentelemetry::{Context, KeyValue};
use serde::Deserialize;

use crate::semconv::{self, DB_SQL_ARGS_PREFIX};

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl From<&Value> for opentelemetry::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => "NULL".into(),
            Value::Bool(b) => (*b).into(),
            Value::Int(i) => (*i).into(),
            Value::Float(f) => (*f).into(),
            Value::Text(s) => s.clone().into(),
            Value::Bytes(b) => hex::encode(b).into(),
            Value::Timestamp(ts) => ts.to_rfc3339().into(),
        }
    }
}

/// A statement argument with its optional name and 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub name: Option<String>,
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    /// Positional argument.
    pub fn positional(ordinal: usize, value: Value) -> Self {
        Self {
            name: None,
            ordinal,
            value,
        }
    }

    /// Named argument.
    pub fn named(name: impl Into<String>, ordinal: usize, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value,
        }
    }

    /// Attribute key for this argument: `db.sql.args.<name>` or `db.sql.args.<ordinal>`.
    pub fn attribute_key(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => format!("{DB_SQL_ARGS_PREFIX}{name}"),
            _ => format!("{DB_SQL_ARGS_PREFIX}{}", self.ordinal),
        }
    }
}

/// Derives attributes from a statement and its arguments.
///
/// Implementations must be pure and total: no metric emission, no
/// mutation, and no failure. Extraction that can fail has to fall back to
/// an empty or partial set on its own.
pub trait AttributeExtractor: Send + Sync {
    fn extract(&self, cx: &Context, query: &str, args: &[NamedValue]) -> Vec<KeyValue>;
}

impl<F> AttributeExtractor for F
where
    F: Fn(&Context, &str, &[NamedValue]) -> Vec<KeyValue> + Send + Sync,
{
    fn extract(&self, cx: &Context, query: &str, args: &[NamedValue]) -> Vec<KeyValue> {
        self(cx, query, args)
    }
}

/// Extracts nothing. Use it to keep statement contents out of metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

impl AttributeExtractor for NoopExtractor {
    fn extract(&self, _cx: &Context, _query: &str, _args: &[NamedValue]) -> Vec<KeyValue> {
        Vec::new()
    }
}

/// Records the statement text, and optionally its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementExtractor {
    include_args: bool,
}

impl StatementExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit one `db.sql.args.*` attribute per argument.
    pub fn with_args(mut self) -> Self {
        self.include_args = true;
        self
    }
}

impl AttributeExtractor for StatementExtractor {
    fn extract(&self, _cx: &Context, query: &str, args: &[NamedValue]) -> Vec<KeyValue> {
        let mut attrs = Vec::with_capacity(1 + if self.include_args { args.len() } else { 0 });
        attrs.push(semconv::statement_attr(query));

        if self.include_args {
            attrs.extend(
                args.iter()
                    .map(|arg| KeyValue::new(arg.attribute_key(), &arg.value)),
            );
        }

        attrs
    }
}

/// How much of a statement ends up in metric attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCapture {
    /// Nothing.
    #[default]
    None,
    /// Statement text.
    Statement,
    /// Statement text and bound arguments.
    StatementWithArgs,
}

impl QueryCapture {
    /// Parse the configuration spelling (`none`, `statement`, `statement_with_args`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(QueryCapture::None),
            "statement" => Some(QueryCapture::Statement),
            "statement_with_args" => Some(QueryCapture::StatementWithArgs),
            _ => None,
        }
    }

    /// The extractor implementing this capture level.
    pub fn extractor(self) -> Box<dyn AttributeExtractor> {
        match self {
            QueryCapture::None => Box::new(NoopExtractor),
            QueryCapture::Statement => Box::new(StatementExtractor::new()),
            QueryCapture::StatementWithArgs => Box::new(StatementExtractor::new().with_args()),
        }
    }
}

impl fmt::Display for QueryCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryCapture::None => "none",
            QueryCapture::Statement => "statement",
            QueryCapture::StatementWithArgs => "statement_with_args",
        };
        f.write_str(s)
    }
}
