//! # Tuple Schema
//!
//! A fixed list of positional item schemas. Without a rest schema the
//! input length must equal the item count; with one, the input may be
//! longer and every trailing element is validated against the rest schema.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, Flow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

fn shape_matches(items: usize, has_rest: bool, len: usize) -> bool {
    if has_rest {
        len >= items
    } else {
        len == items
    }
}

#[derive(Debug, Clone)]
pub struct TupleSchema {
    items: Vec<SchemaRef>,
    rest: Option<SchemaRef>,
    message: String,
    pipe: Pipe,
}

impl TupleSchema {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            rest: None,
            message: INVALID_TYPE.to_string(),
            pipe: Pipe::new(),
        }
    }

    /// Append a positional item.
    pub fn item(mut self, schema: impl Schema + 'static) -> Self {
        self.items.push(schema.shared());
        self
    }

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

    fn schema_at(&self, index: usize) -> Option<&SchemaRef> {
        self.items.get(index).or(self.rest.as_ref())
    }
}

impl Default for TupleSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaNode for TupleSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Tuple
    }
}

impl Schema for TupleSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let values = match input {
            Value::Array(values) if shape_matches(self.items.len(), self.rest.is_some(), values.len()) => values,
            _ => return schema_issue(settings, SchemaKind::Tuple, &self.message, input, None),
        };

        let mut agg = Aggregate::new();
        let mut output = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let Some(schema) = self.schema_at(index) else { break };
            let result = schema.parse(value, settings);
            match agg.absorb(result, || PathItem::tuple(input, index, value), settings) {
                Flow::Continue { output: item, .. } => output.push(item),
                Flow::Abort => break,
            }
        }
        agg.finish(Value::Array(output), &self.pipe, settings, SchemaKind::Tuple)
    }
}

#[derive(Debug, Clone)]
pub struct TupleSchemaAsync {
    items: Vec<AsyncSchemaRef>,
    rest: Option<AsyncSchemaRef>,
    message: String,
    pipe: PipeAsync,
}

impl TupleSchemaAsync {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            rest: None,
            message: INVALID_TYPE.to_string(),
            pipe: PipeAsync::new(),
        }
    }

    pub fn item(mut self, schema: impl AsyncSchema + 'static) -> Self {
        self.items.push(schema.shared_async());
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

    fn schema_at(&self, index: usize) -> Option<&AsyncSchemaRef> {
        self.items.get(index).or(self.rest.as_ref())
    }
}

impl Default for TupleSchemaAsync {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaNode for TupleSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Tuple
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for TupleSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let values = match input {
                Value::Array(values)
                    if shape_matches(self.items.len(), self.rest.is_some(), values.len()) =>
                {
                    values
                }
                _ => return schema_issue(settings, SchemaKind::Tuple, &self.message, input, None),
            };

            let mut pending: FuturesUnordered<_> = values
                .iter()
                .enumerate()
                .filter_map(|(index, value)| {
                    let schema = self.schema_at(index)?;
                    Some(schema.parse_async(value, settings).map(move |r| (index, r)))
                })
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<Value>> = vec![None; values.len()];
            while let Some((index, result)) = pending.next().await {
                let value = &values[index];
                match agg.absorb(result, || PathItem::tuple(input, index, value), settings) {
                    Flow::Continue { output, .. } => slots[index] = Some(output),
                    Flow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "tuple validation aborted early");
                        break;
                    }
                }
            }

            let output = slots.into_iter().flatten().collect();
            agg.finish_async(Value::Array(output), &self.pipe, settings, SchemaKind::Tuple)
                .await
        }
        .boxed()
    }
}

/// An empty tuple schema; add positions with [`TupleSchema::item`].
pub fn tuple() -> TupleSchema {
    TupleSchema::new()
}

pub fn tuple_async() -> TupleSchemaAsync {
    TupleSchemaAsync::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{boolean, number, string};
    use conform_core::PathKind;
    use serde_json::json;

    fn pair() -> TupleSchema {
        tuple().item(string()).item(number())
    }

    #[test]
    fn test_exact_length_without_rest() {
        let settings = ParseSettings::default();
        assert!(pair().parse(&Value::from(json!(["a", 1])), &settings).is_valid());
        assert!(!pair().parse(&Value::from(json!(["a"])), &settings).typed);
        assert!(!pair().parse(&Value::from(json!(["a", 1, 2])), &settings).typed);
    }

    #[test]
    fn test_rest_accepts_trailing() {
        let schema = pair().rest(boolean());
        let settings = ParseSettings::default();
        let result = schema.parse(&Value::from(json!(["a", 1, true, false])), &settings);
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from(json!(["a", 1, true, false])));

        let result = schema.parse(&Value::from(json!(["a", 1, true, 0])), &settings);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].path.to_string(), "[3]");
        assert_eq!(result.issues[0].path.get(0).map(|p| p.kind), Some(PathKind::Tuple));

        assert!(!schema.parse(&Value::from(json!(["a"])), &settings).typed);
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let input = Value::from(json!([1, "x"]));
        let settings = ParseSettings::default();
        let sync = pair().parse(&input, &settings);
        let asynchronous = tuple_async()
            .item(string())
            .item(number())
            .parse_async(&input, &settings)
            .await;
        assert_eq!(sync.typed, asynchronous.typed);
        assert_eq!(sync.issues.len(), asynchronous.issues.len());
    }
}
