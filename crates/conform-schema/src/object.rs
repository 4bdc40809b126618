//! # Object Schema
//!
//! Validates a [`Value::Object`] entry by entry. Configured entries are
//! visited in declaration order; when a rest schema is configured every
//! remaining input key is visited afterwards in input order.
//!
//! ## Output
//!
//! An entry's output is assigned when it is not `Undefined` or when the key
//! was present on the input. An absent optional key therefore stays absent,
//! while `{"a": undefined}` round-trips. Rest outputs are always assigned.
//! Keys not covered by an entry or the rest schema are dropped.
//!
//! ## Async
//!
//! [`ObjectSchemaAsync`] launches every entry and rest validation before
//! awaiting any of them. Outputs land in positional slots, so the output
//! order matches the sync schema; issues are collected in completion order.
//! Under `abort_early` the first issue stops the wait and drops the
//! validations still in flight.

use std::collections::HashSet;

use conform_core::{schema_issue, Object, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{lift, Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::aggregate::{Aggregate, Flow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{lift_schema, AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

fn key_set<S>(entries: &[(String, S)]) -> HashSet<String> {
    entries.iter().map(|(key, _)| key.clone()).collect()
}

fn assign_entry(output: &mut Object, input: &Object, key: &str, value: Value) {
    if !value.is_undefined() || input.contains_key(key) {
        output.insert(key.to_string(), value);
    }
}

// ─── Sync ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    entries: Vec<(String, SchemaRef)>,
    rest: Option<SchemaRef>,
    message: String,
    pipe: Pipe,
    keys: OnceCell<HashSet<String>>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            rest: None,
            message: INVALID_TYPE.to_string(),
            pipe: Pipe::new(),
            keys: OnceCell::new(),
        }
    }

    /// Declare an entry. Redeclaring a key replaces its schema in place.
    pub fn entry(mut self, key: impl Into<String>, schema: impl Schema + 'static) -> Self {
        let key = key.into();
        let schema = schema.shared();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = schema,
            None => self.entries.push((key, schema)),
        }
        self.keys = OnceCell::new();
        self
    }

    /// Validate every undeclared input key against `schema`.
    pub fn rest(mut self, schema: impl Schema + 'static) -> Self {
        self.rest = Some(schema.shared());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn pipe(mut self, pipe: Pipe) -> Self {
        self.pipe = pipe;
        self
    }

    pub fn step(mut self, step: impl Action + 'static) -> Self {
        self.pipe.push(Arc::new(step));
        self
    }

    pub fn entries(&self) -> &[(String, SchemaRef)] {
        &self.entries
    }

    /// Schema declared for `key`.
    pub fn entry_schema(&self, key: &str) -> Option<&SchemaRef> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, schema)| schema)
    }

    /// Whether `key` is a declared entry. Backed by a lazily built key set.
    pub fn has_entry(&self, key: &str) -> bool {
        self.keys.get_or_init(|| key_set(&self.entries)).contains(key)
    }
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaNode for ObjectSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Object
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Value::Object(map) = input else {
            return schema_issue(settings, SchemaKind::Object, &self.message, input, None);
        };

        let mut agg = Aggregate::new();
        let mut output = Object::new();
        let mut aborted = false;

        for (key, schema) in &self.entries {
            let value = input.get(key);
            let result = schema.parse(value, settings);
            match agg.absorb(result, || PathItem::object(input, key, value), settings) {
                Flow::Continue { output: entry, .. } => assign_entry(&mut output, map, key, entry),
                Flow::Abort => {
                    aborted = true;
                    break;
                }
            }
        }

        if let (Some(rest), false) = (&self.rest, aborted) {
            for (key, value) in map.iter().filter(|(key, _)| !self.has_entry(key)) {
                let result = rest.parse(value, settings);
                match agg.absorb(result, || PathItem::object(input, key, value), settings) {
                    Flow::Continue { output: entry, .. } => {
                        output.insert(key.clone(), entry);
                    }
                    Flow::Abort => break,
                }
            }
        }

        agg.finish(Value::Object(output), &self.pipe, settings, SchemaKind::Object)
    }
}

// ─── Async ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ObjectSchemaAsync {
    entries: Vec<(String, AsyncSchemaRef)>,
    rest: Option<AsyncSchemaRef>,
    message: String,
    pipe: PipeAsync,
    keys: OnceCell<HashSet<String>>,
}

impl ObjectSchemaAsync {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            rest: None,
            message: INVALID_TYPE.to_string(),
            pipe: PipeAsync::new(),
            keys: OnceCell::new(),
        }
    }

    pub fn entry(mut self, key: impl Into<String>, schema: impl AsyncSchema + 'static) -> Self {
        let key = key.into();
        let schema = schema.shared_async();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = schema,
            None => self.entries.push((key, schema)),
        }
        self.keys = OnceCell::new();
        self
    }

    pub fn rest(mut self, schema: impl AsyncSchema + 'static) -> Self {
        self.rest = Some(schema.shared_async());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn pipe(mut self, pipe: PipeAsync) -> Self {
        self.pipe = pipe;
        self
    }

    pub fn step(mut self, step: impl AsyncAction + 'static) -> Self {
        self.pipe.push(Arc::new(step));
        self
    }

    pub fn entries(&self) -> &[(String, AsyncSchemaRef)] {
        &self.entries
    }

    pub fn entry_schema(&self, key: &str) -> Option<&AsyncSchemaRef> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, schema)| schema)
    }

    pub fn has_entry(&self, key: &str) -> bool {
        self.keys.get_or_init(|| key_set(&self.entries)).contains(key)
    }
}

impl Default for ObjectSchemaAsync {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectSchema> for ObjectSchemaAsync {
    fn from(schema: ObjectSchema) -> Self {
        Self {
            entries: schema
                .entries
                .into_iter()
                .map(|(key, schema)| (key, lift_schema(schema)))
                .collect(),
            rest: schema.rest.map(lift_schema),
            message: schema.message,
            pipe: schema.pipe.into_iter().map(lift).collect(),
            keys: OnceCell::new(),
        }
    }
}

impl SchemaNode for ObjectSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Object
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for ObjectSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Value::Object(map) = input else {
                return schema_issue(settings, SchemaKind::Object, &self.message, input, None);
            };

            let declared = self.entries.len();
            let rest_entries: Vec<(&'a String, &'a Value)> = match &self.rest {
                Some(_) => map.iter().filter(|(key, _)| !self.has_entry(key)).collect(),
                None => Vec::new(),
            };

            let mut pending: FuturesUnordered<BoxFuture<'a, (usize, SchemaResult)>> =
                FuturesUnordered::new();
            for (index, (key, schema)) in self.entries.iter().enumerate() {
                let value = input.get(key);
                pending.push(schema.parse_async(value, settings).map(move |r| (index, r)).boxed());
            }
            if let Some(rest) = &self.rest {
                for (offset, &(_, value)) in rest_entries.iter().enumerate() {
                    let index = declared + offset;
                    pending.push(rest.parse_async(value, settings).map(move |r| (index, r)).boxed());
                }
            }

            let position = |index: usize| -> (&'a str, &'a Value) {
                if index < declared {
                    let key = self.entries[index].0.as_str();
                    (key, input.get(key))
                } else {
                    let (key, value) = rest_entries[index - declared];
                    (key.as_str(), value)
                }
            };

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<Value>> = vec![None; declared + rest_entries.len()];
            while let Some((index, result)) = pending.next().await {
                let (key, value) = position(index);
                match agg.absorb(result, || PathItem::object(input, key, value), settings) {
                    Flow::Continue { output, .. } => slots[index] = Some(output),
                    Flow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "object validation aborted early");
                        break;
                    }
                }
            }

            let mut output = Object::new();
            for (index, slot) in slots.into_iter().enumerate() {
                let Some(entry) = slot else { continue };
                let (key, _) = position(index);
                if index < declared {
                    assign_entry(&mut output, map, key, entry);
                } else {
                    output.insert(key.to_string(), entry);
                }
            }

            agg.finish_async(Value::Object(output), &self.pipe, settings, SchemaKind::Object)
                .await
        }
        .boxed()
    }
}

// ─── Constructors ───────────────────────────────────────────────────

/// An object schema without entries; add them with [`ObjectSchema::entry`].
pub fn object() -> ObjectSchema {
    ObjectSchema::new()
}

pub fn object_async() -> ObjectSchemaAsync {
    ObjectSchemaAsync::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{number, number_async, string};
    use crate::wrapper::optional;
    use conform_core::PathKey;
    use conform_pipe::validations::min_length;
    use serde_json::json;
    use std::time::Duration;

    fn parse(schema: &ObjectSchema, input: serde_json::Value) -> SchemaResult {
        schema.parse(&Value::from(input), &ParseSettings::default())
    }

    #[test]
    fn test_valid_object() {
        let schema = object().entry("name", string()).entry("age", number());
        let result = parse(&schema, json!({"name": "Ada", "age": 36}));
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from(json!({"name": "Ada", "age": 36})));
    }

    #[test]
    fn test_non_object_input() {
        let schema = object().entry("a", string());
        for input in [json!(null), json!([1]), json!("x")] {
            let result = parse(&schema, input);
            assert!(!result.typed);
            assert_eq!(result.issues[0].schema, SchemaKind::Object);
            assert!(result.issues[0].path.is_empty());
        }
    }

    #[test]
    fn test_unknown_keys_stripped_without_rest() {
        let schema = object().entry("a", string());
        let result = parse(&schema, json!({"a": "x", "b": 1}));
        assert_eq!(result.output, Value::from(json!({"a": "x"})));
    }

    #[test]
    fn test_absent_optional_key_stays_absent() {
        let schema = object().entry("a", optional(string()));
        let result = parse(&schema, json!({}));
        assert!(result.is_valid());
        assert_eq!(result.output.as_object().map(|o| o.len()), Some(0));

        let mut present = Object::new();
        present.insert("a".into(), Value::Undefined);
        let result = schema.parse(&Value::Object(present), &ParseSettings::default());
        assert_eq!(result.output.as_object().map(|o| o.contains_key("a")), Some(true));
    }

    #[test]
    fn test_optional_default_fills_absent_key() {
        let schema = object().entry("a", optional(string()).default("d"));
        assert_eq!(parse(&schema, json!({})).output, Value::from(json!({"a": "d"})));
    }

    #[test]
    fn test_issue_paths_and_collection() {
        let schema = object().entry("a", string()).entry("b", number());
        let result = parse(&schema, json!({"a": 1, "b": "x"}));
        assert!(!result.typed);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].path.keys(), vec![&PathKey::Name("a".into())]);
        assert_eq!(result.issues[1].path.to_string(), "b");
        let item = result.issues[1].path.get(0).map(|p| p.value.clone());
        assert_eq!(item, Some(Value::from("x")));
    }

    #[test]
    fn test_abort_early() {
        let schema = object().entry("a", string()).entry("b", number());
        let settings = ParseSettings::default().with_abort_early(true);
        let result = schema.parse(&Value::from(json!({"a": 1, "b": "x"})), &settings);
        assert_eq!(result.issues.len(), 1);
        assert!(!result.typed);
    }

    #[test]
    fn test_rest_entries() {
        let schema = object().entry("a", string()).rest(number());
        let result = parse(&schema, json!({"a": "x", "b": 1, "c": 2}));
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from(json!({"a": "x", "b": 1, "c": 2})));

        let result = parse(&schema, json!({"a": "x", "b": "y"}));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].path.to_string(), "b");
    }

    #[test]
    fn test_pipe_runs_only_when_typed() {
        let schema = object()
            .entry("a", string())
            .step(conform_pipe::check("has_a", "needs a", |v| !v.get("a").is_undefined()));
        let result = parse(&schema, json!({"a": 1}));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].schema, SchemaKind::String);

        let schema = object().entry("a", string().step(min_length(3)));
        let result = parse(&schema, json!({"a": "x"}));
        assert!(result.typed);
        assert_eq!(result.issues[0].kind, "min_length");
    }

    #[test]
    fn test_has_entry_cache_reset_on_entry() {
        let schema = object().entry("a", string());
        assert!(schema.has_entry("a"));
        let schema = schema.entry("b", number());
        assert!(schema.has_entry("b"));
    }

    #[tokio::test]
    async fn test_async_output_order_is_positional() {
        let slow = number_async().step(conform_pipe::transform_async(|v: Value| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            v
        }));
        let schema = object_async().entry("slow", slow).entry("fast", number());
        let result = schema
            .parse_async(&Value::from(json!({"fast": 1, "slow": 2})), &ParseSettings::default())
            .await;
        assert!(result.is_valid());
        let keys: Vec<&String> = result.output.as_object().map(|o| o.keys().collect()).unwrap_or_default();
        assert_eq!(keys, ["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_async_issue_order_follows_completion() {
        let slow = number_async().step(conform_pipe::check_async("slow", "slow fails", |_| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            false
        }));
        let schema = object_async().entry("a", slow).entry("b", string());
        let result = schema
            .parse_async(&Value::from(json!({"a": 1, "b": 2})), &ParseSettings::default())
            .await;
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].path.to_string(), "b");
        assert_eq!(result.issues[1].path.to_string(), "a");
    }

    #[tokio::test]
    async fn test_async_abort_early_drops_in_flight() {
        let slow = number_async().step(conform_pipe::check_async("slow", "slow fails", |_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            false
        }));
        let schema = object_async().entry("a", slow).entry("b", string());
        let settings = ParseSettings::default().with_abort_early(true);
        let result = schema.parse_async(&Value::from(json!({"a": 1, "b": 2})), &settings).await;
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].path.to_string(), "b");
        assert!(!result.typed);
    }

    #[tokio::test]
    async fn test_from_sync_object() {
        let schema: ObjectSchemaAsync = object().entry("a", string()).rest(number()).into();
        let result = schema
            .parse_async(&Value::from(json!({"a": "x", "n": 1})), &ParseSettings::default())
            .await;
        assert!(result.is_valid());
        assert!(schema.has_entry("a"));
    }
}
