//! # Array Schema
//!
//! Validates every element of a [`Value::Array`] against one item schema,
//! keyed by index in issue paths. The async schema launches every element
//! before awaiting any and keeps outputs in index order.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, Flow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

#[derive(Debug, Clone)]
pub struct ArraySchema {
    item: SchemaRef,
    message: String,
    pipe: Pipe,
}

impl ArraySchema {
    pub fn new(item: impl Schema + 'static) -> Self {
        Self {
            item: item.shared(),
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

    pub fn item(&self) -> &SchemaRef {
        &self.item
    }
}

impl SchemaNode for ArraySchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Array
    }
}

impl Schema for ArraySchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Value::Array(items) = input else {
            return schema_issue(settings, SchemaKind::Array, &self.message, input, None);
        };

        let mut agg = Aggregate::new();
        let mut output = Vec::with_capacity(items.len());
        for (index, value) in items.iter().enumerate() {
            let result = self.item.parse(value, settings);
            match agg.absorb(result, || PathItem::array(input, index, value), settings) {
                Flow::Continue { output: item, .. } => output.push(item),
                Flow::Abort => break,
            }
        }
        agg.finish(Value::Array(output), &self.pipe, settings, SchemaKind::Array)
    }
}

#[derive(Debug, Clone)]
pub struct ArraySchemaAsync {
    item: AsyncSchemaRef,
    message: String,
    pipe: PipeAsync,
}

impl ArraySchemaAsync {
    pub fn new(item: impl AsyncSchema + 'static) -> Self {
        Self {
            item: item.shared_async(),
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

impl SchemaNode for ArraySchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Array
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for ArraySchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Value::Array(items) = input else {
                return schema_issue(settings, SchemaKind::Array, &self.message, input, None);
            };

            let mut pending: FuturesUnordered<_> = items
                .iter()
                .enumerate()
                .map(|(index, value)| self.item.parse_async(value, settings).map(move |r| (index, r)))
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<Value>> = vec![None; items.len()];
            while let Some((index, result)) = pending.next().await {
                let value = &items[index];
                match agg.absorb(result, || PathItem::array(input, index, value), settings) {
                    Flow::Continue { output, .. } => slots[index] = Some(output),
                    Flow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "array validation aborted early");
                        break;
                    }
                }
            }

            let output = slots.into_iter().flatten().collect();
            agg.finish_async(Value::Array(output), &self.pipe, settings, SchemaKind::Array)
                .await
        }
        .boxed()
    }
}

pub fn array(item: impl Schema + 'static) -> ArraySchema {
    ArraySchema::new(item)
}

pub fn array_async(item: impl AsyncSchema + 'static) -> ArraySchemaAsync {
    ArraySchemaAsync::new(item)
}
