//! # Map Schema
//!
//! Validates every entry of a [`Value::Map`] against a key schema and a
//! value schema. A failure on either half of an entry is reported under one
//! shared path item keyed by the entry's key.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, PairFlow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

#[derive(Debug, Clone)]
pub struct MapSchema {
    key: SchemaRef,
    value: SchemaRef,
    message: String,
    pipe: Pipe,
}

impl MapSchema {
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

impl SchemaNode for MapSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Map
    }
}

impl Schema for MapSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Value::Map(entries) = input else {
            return schema_issue(settings, SchemaKind::Map, &self.message, input, None);
        };

        let key_settings = settings.for_key();
        let value_settings = settings.for_value();
        let mut agg = Aggregate::new();
        let mut output = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            let flow = agg.absorb_pair(
                self.key.parse(key, &key_settings),
                || self.value.parse(value, &value_settings),
                || PathItem::map(input, key, value),
                settings,
            );
            match flow {
                PairFlow::Continue { key, value, clean } => {
                    if clean {
                        Value::map_insert(&mut output, key, value);
                    }
                }
                PairFlow::Abort => break,
            }
        }

        agg.finish(Value::Map(output), &self.pipe, settings, SchemaKind::Map)
    }
}

#[derive(Debug, Clone)]
pub struct MapSchemaAsync {
    key: AsyncSchemaRef,
    value: AsyncSchemaRef,
    message: String,
    pipe: PipeAsync,
}

impl MapSchemaAsync {
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

impl SchemaNode for MapSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Map
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for MapSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Value::Map(entries) = input else {
                return schema_issue(settings, SchemaKind::Map, &self.message, input, None);
            };

            let key_settings = settings.for_key();
            let value_settings = settings.for_value();
            let mut pending: FuturesUnordered<_> = entries
                .iter()
                .enumerate()
                .map(|(index, (key, value))| {
                    future::join(
                        self.key.parse_async(key, &key_settings),
                        self.value.parse_async(value, &value_settings),
                    )
                    .map(move |pair| (index, pair))
                })
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<(Value, Value)>> = vec![None; entries.len()];
            while let Some((index, (key_result, value_result))) = pending.next().await {
                let (key, value) = &entries[index];
                let flow = agg.absorb_pair(
                    key_result,
                    || value_result,
                    || PathItem::map(input, key, value),
                    settings,
                );
                match flow {
                    PairFlow::Continue { key, value, clean } => {
                        if clean {
                            slots[index] = Some((key, value));
                        }
                    }
                    PairFlow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "map validation aborted early");
                        break;
                    }
                }
            }
            drop(pending);

            let mut output = Vec::with_capacity(entries.len());
            for (key, value) in slots.into_iter().flatten() {
                Value::map_insert(&mut output, key, value);
            }
            agg.finish_async(Value::Map(output), &self.pipe, settings, SchemaKind::Map)
                .await
        }
        .boxed()
    }
}

pub fn map(key: impl Schema + 'static, value: impl Schema + 'static) -> MapSchema {
    MapSchema::new(key, value)
}

pub fn map_async(key: impl AsyncSchema + 'static, value: impl AsyncSchema + 'static) -> MapSchemaAsync {
    MapSchemaAsync::new(key, value)
}
