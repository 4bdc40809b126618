//! # Issues and Paths
//!
//! An [`Issue`] is one validation failure. It is created once at the failure
//! site with an empty [`Path`] and is afterwards only modified by structural
//! ancestors prepending a [`PathItem`] while it propagates toward the root.
//! Path order is therefore always root-to-leaf.
//!
//! Union and variant failures attach the per-candidate issues they collected
//! as nested [`Issue::issues`]; [`Issue::flatten`] walks them.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::kind::SchemaKind;
use crate::settings::{Origin, ParseSettings};
use crate::value::Value;

/// Kind of container a path item was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Object,
    Array,
    Tuple,
    Record,
    Map,
    Set,
}

/// Position of a child inside its container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathKey {
    /// Object or record property name.
    Name(String),
    /// Array or tuple index, or ordinal position inside a set.
    Index(usize),
    /// Map entry key.
    Value(Value),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// One step of an issue path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathItem {
    pub kind: PathKind,
    /// The container at this level.
    pub input: Value,
    pub key: PathKey,
    /// The value found at `key`.
    pub value: Value,
}

impl PathItem {
    pub fn object(input: &Value, key: &str, value: &Value) -> Self {
        Self::named(PathKind::Object, input, key, value)
    }

    pub fn record(input: &Value, key: &str, value: &Value) -> Self {
        Self::named(PathKind::Record, input, key, value)
    }

    pub fn array(input: &Value, index: usize, value: &Value) -> Self {
        Self::indexed(PathKind::Array, input, index, value)
    }

    pub fn tuple(input: &Value, index: usize, value: &Value) -> Self {
        Self::indexed(PathKind::Tuple, input, index, value)
    }

    pub fn set(input: &Value, index: usize, value: &Value) -> Self {
        Self::indexed(PathKind::Set, input, index, value)
    }

    pub fn map(input: &Value, key: &Value, value: &Value) -> Self {
        Self {
            kind: PathKind::Map,
            input: input.clone(),
            key: PathKey::Value(key.clone()),
            value: value.clone(),
        }
    }

    fn named(kind: PathKind, input: &Value, key: &str, value: &Value) -> Self {
        Self {
            kind,
            input: input.clone(),
            key: PathKey::Name(key.to_string()),
            value: value.clone(),
        }
    }

    fn indexed(kind: PathKind, input: &Value, index: usize, value: &Value) -> Self {
        Self {
            kind,
            input: input.clone(),
            key: PathKey::Index(index),
            value: value.clone(),
        }
    }
}

/// Root-to-leaf sequence of path items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path(VecDeque<PathItem>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item in front of the existing ones.
    pub fn push_front(&mut self, item: PathItem) {
        self.0.push_front(item);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathItem> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PathItem> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&PathItem> {
        self.0.back()
    }

    /// The keys along the path, root first.
    pub fn keys(&self) -> Vec<&PathKey> {
        self.0.iter().map(|item| &item.key).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            match &item.key {
                PathKey::Name(name) if i == 0 => f.write_str(name)?,
                PathKey::Name(name) => write!(f, ".{name}")?,
                PathKey::Index(index) => write!(f, "[{index}]")?,
                PathKey::Value(Value::String(s)) => write!(f, "[{s:?}]")?,
                PathKey::Value(value) => write!(f, "[{value}]")?,
            }
        }
        Ok(())
    }
}

/// One structured validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// `"type"` for structural mismatches, otherwise the failing step's kind
    /// (for example `"min_length"`).
    pub kind: Cow<'static, str>,
    /// Kind of the schema that produced the issue.
    pub schema: SchemaKind,
    pub message: String,
    /// The offending value.
    pub input: Value,
    pub origin: Origin,
    pub path: Path,
    /// Per-candidate sub-issues attached by union and variant failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl Issue {
    pub fn new(
        settings: &ParseSettings,
        kind: impl Into<Cow<'static, str>>,
        schema: SchemaKind,
        message: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            schema,
            message: message.into(),
            input,
            origin: settings.origin,
            path: Path::new(),
            issues: Vec::new(),
        }
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    /// Whether this is a structural type mismatch rather than a pipe issue.
    pub fn is_type_issue(&self) -> bool {
        self.kind == "type"
    }

    /// Depth-first list of the innermost issues: nested candidate issues
    /// replace their parent, leaves are returned as-is.
    pub fn flatten(&self) -> Vec<&Issue> {
        if self.issues.is_empty() {
            vec![self]
        } else {
            self.issues.iter().flat_map(Issue::flatten).collect()
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({}): {}", self.schema, self.kind, self.message)
        } else {
            write!(f, "{}: {} ({}): {}", self.path, self.schema, self.kind, self.message)
        }
    }
}

/// Prepend `item` to the path of every issue.
pub fn prepend_path(issues: &mut [Issue], item: &PathItem) {
    for issue in issues {
        issue.path.push_front(item.clone());
    }
}
