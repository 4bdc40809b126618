//! # Set Schema
//!
//! Validates every member of a [`Value::Set`] against one value schema.
//! Sets have no keys, so issue paths carry the member's ordinal position.
//! Transformed members that collapse onto one another are deduplicated in
//! the output.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, PathItem, SchemaKind, SchemaResult, Value};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, Flow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

#[derive(Debug, Clone)]
pub struct SetSchema {
    value: SchemaRef,
    message: String,
    pipe: Pipe,
}

impl SetSchema {
    pub fn new(value: impl Schema + 'static) -> Self {
        Self {
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

impl SchemaNode for SetSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Set
    }
}

impl Schema for SetSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Value::Set(members) = input else {
            return schema_issue(settings, SchemaKind::Set, &self.message, input, None);
        };

        let mut agg = Aggregate::new();
        let mut output = Vec::with_capacity(members.len());
        for (index, value) in members.iter().enumerate() {
            let result = self.value.parse(value, settings);
            match agg.absorb(result, || PathItem::set(input, index, value), settings) {
                Flow::Continue { output: member, .. } => Value::set_insert(&mut output, member),
                Flow::Abort => break,
            }
        }
        agg.finish(Value::Set(output), &self.pipe, settings, SchemaKind::Set)
    }
}

#[derive(Debug, Clone)]
pub struct SetSchemaAsync {
    value: AsyncSchemaRef,
    message: String,
    pipe: PipeAsync,
}

impl SetSchemaAsync {
    pub fn new(value: impl AsyncSchema + 'static) -> Self {
        Self {
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

impl SchemaNode for SetSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Set
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for SetSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Value::Set(members) = input else {
                return schema_issue(settings, SchemaKind::Set, &self.message, input, None);
            };

            let mut pending: FuturesUnordered<_> = members
                .iter()
                .enumerate()
                .map(|(index, value)| self.value.parse_async(value, settings).map(move |r| (index, r)))
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<Value>> = vec![None; members.len()];
            while let Some((index, result)) = pending.next().await {
                let value = &members[index];
                match agg.absorb(result, || PathItem::set(input, index, value), settings) {
                    Flow::Continue { output, .. } => slots[index] = Some(output),
                    Flow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "set validation aborted early");
                        break;
                    }
                }
            }
            drop(pending);

            let mut output = Vec::with_capacity(members.len());
            for member in slots.into_iter().flatten() {
                Value::set_insert(&mut output, member);
            }
            agg.finish_async(Value::Set(output), &self.pipe, settings, SchemaKind::Set)
                .await
        }
        .boxed()
    }
}

pub fn set(value: impl Schema + 'static) -> SetSchema {
    SetSchema::new(value)
}

pub fn set_async(value: impl AsyncSchema + 'static) -> SetSchemaAsync {
    SetSchemaAsync::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{number, string};
    use conform_core::{PathKey, PathKind};
    use conform_pipe::transformations::to_trimmed;
    use conform_pipe::validations::max_size;

    fn members(values: &[Value]) -> Value {
        Value::Set(values.to_vec())
    }

    #[test]
    fn test_valid_set() {
        let input = members(&[Value::from(1), Value::from(2)]);
        let result = set(number()).parse(&input, &ParseSettings::default());
        assert!(result.is_valid());
        assert_eq!(result.output, input);
    }

    #[test]
    fn test_issue_path_is_ordinal() {
        let input = members(&[Value::from(1), Value::from("x")]);
        let result = set(number()).parse(&input, &ParseSettings::default());
        assert!(!result.typed);
        let item = result.issues[0].path.get(0).cloned();
        assert_eq!(item.as_ref().map(|p| p.kind), Some(PathKind::Set));
        assert_eq!(item.map(|p| p.key), Some(PathKey::Index(1)));
    }

    #[test]
    fn test_collapsed_members_deduplicate() {
        let input = members(&[Value::from("a "), Value::from(" a")]);
        let result = set(string().step(to_trimmed())).parse(&input, &ParseSettings::default());
        assert_eq!(result.output, members(&[Value::from("a")]));
    }

    #[test]
    fn test_own_pipe_sees_output() {
        let input = members(&[Value::from(1), Value::from(2), Value::from(3)]);
        let result = set(number()).step(max_size(2)).parse(&input, &ParseSettings::default());
        assert!(result.typed);
        assert_eq!(result.issues[0].kind, "max_size");
    }

    #[tokio::test]
    async fn test_async_set() {
        let input = members(&[Value::from("x"), Value::from(2)]);
        let settings = ParseSettings::default();
        let sync = set(number()).parse(&input, &settings);
        let asynchronous = set_async(number()).parse_async(&input, &settings).await;
        assert_eq!(sync, asynchronous);
    }
}
