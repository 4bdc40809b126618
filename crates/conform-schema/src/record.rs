//! # Record Schema
//!
//! Validates every own key and value of a [`Value::Object`] against a key
//! schema and a value schema. Keys are validated with `origin = key`.
//!
//! ## Blocked Keys
//!
//! [`BLOCKED_KEYS`] are never visited, validated or copied to the output,
//! whatever the key schema accepts.
//!
//! ## Output
//!
//! An entry is assigned only when neither key nor value reported an issue. The key
//! output is used as the property name; a transformed non-string key
//! contributes its display form.

use std::sync::Arc;

use conform_core::{schema_issue, Object, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, PairFlow};
use crate::leaf::{string, INVALID_TYPE};
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

/// Property names a record never iterates.
pub const BLOCKED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

fn is_blocked(key: &str) -> bool {
    BLOCKED_KEYS.contains(&key)
}

fn assign(output: &mut Object, flow: PairFlow) -> bool {
    match flow {
        PairFlow::Continue { key, value, clean } => {
            if clean {
                output.insert(key.to_key_string(), value);
            }
            true
        }
        PairFlow::Abort => false,
    }
}

#[derive(Debug, Clone)]
pub struct RecordSchema {
    key: SchemaRef,
    value: SchemaRef,
    message: String,
    pipe: Pipe,
}

impl RecordSchema {
    pub fn new(key: impl Schema + 'static, value: impl Schema + 'static) -> Self {
        Self {
            key: key.shared(),
            value: value.shared(),
            message: INVALID_TYPE.to_string(),
            pipe: Pipe::new(),
        }
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
}

impl SchemaNode for RecordSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Record
    }
}

impl Schema for RecordSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Value::Object(map) = input else {
            return schema_issue(settings, SchemaKind::Record, &self.message, input, None);
        };

        let key_settings = settings.for_key();
        let value_settings = settings.for_value();
        let mut agg = Aggregate::new();
        let mut output = Object::new();

        for (key, value) in map.iter().filter(|(key, _)| !is_blocked(key)) {
            let key_result = self.key.parse(&Value::from(key.as_str()), &key_settings);
            let flow = agg.absorb_pair(
                key_result,
                || self.value.parse(value, &value_settings),
                || PathItem::record(input, key, value),
                settings,
            );
            if !assign(&mut output, flow) {
                break;
            }
        }

        agg.finish(Value::Object(output), &self.pipe, settings, SchemaKind::Record)
    }
}

#[derive(Debug, Clone)]
pub struct RecordSchemaAsync {
    key: AsyncSchemaRef,
    value: AsyncSchemaRef,
    message: String,
    pipe: PipeAsync,
}

impl RecordSchemaAsync {
    pub fn new(key: impl AsyncSchema + 'static, value: impl AsyncSchema + 'static) -> Self {
        Self {
            key: key.shared_async(),
            value: value.shared_async(),
            message: INVALID_TYPE.to_string(),
            pipe: PipeAsync::new(),
        }
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
}

impl SchemaNode for RecordSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Record
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for RecordSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Value::Object(map) = input else {
                return schema_issue(settings, SchemaKind::Record, &self.message, input, None);
            };

            let key_settings = settings.for_key();
            let value_settings = settings.for_value();
            let entries: Vec<(&String, &Value, Value)> = map
                .iter()
                .filter(|(key, _)| !is_blocked(key))
                .map(|(key, value)| (key, value, Value::from(key.as_str())))
                .collect();

            let mut pending: FuturesUnordered<_> = entries
                .iter()
                .enumerate()
                .map(|(index, (_, value, key_input))| {
                    future::join(
                        self.key.parse_async(key_input, &key_settings),
                        self.value.parse_async(value, &value_settings),
                    )
                    .map(move |pair| (index, pair))
                })
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<(String, Value)>> = vec![None; entries.len()];
            while let Some((index, (key_result, value_result))) = pending.next().await {
                let (key, value, _) = entries[index];
                let flow = agg.absorb_pair(
                    key_result,
                    || value_result,
                    || PathItem::record(input, key, value),
                    settings,
                );
                match flow {
                    PairFlow::Continue { key, value, clean } => {
                        if clean {
                            slots[index] = Some((key.to_key_string(), value));
                        }
                    }
                    PairFlow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "record validation aborted early");
                        break;
                    }
                }
            }
            drop(pending);

            let output: Object = slots.into_iter().flatten().collect();
            agg.finish_async(Value::Object(output), &self.pipe, settings, SchemaKind::Record)
                .await
        }
        .boxed()
    }
}

/// A record with string keys.
pub fn record(value: impl Schema + 'static) -> RecordSchema {
    RecordSchema::new(string(), value)
}

/// A record whose keys are validated against `key`.
pub fn record_with_key(key: impl Schema + 'static, value: impl Schema + 'static) -> RecordSchema {
    RecordSchema::new(key, value)
}

pub fn record_async(value: impl AsyncSchema + 'static) -> RecordSchemaAsync {
    RecordSchemaAsync::new(string(), value)
}

pub fn record_with_key_async(
    key: impl AsyncSchema + 'static,
    value: impl AsyncSchema + 'static,
) -> RecordSchemaAsync {
    RecordSchemaAsync::new(key, value)
}
