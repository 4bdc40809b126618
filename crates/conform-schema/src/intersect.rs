//! # Intersect Schema
//!
//! Runs every option against the same input. When all options are typed,
//! their outputs are folded left to right with
//! [`merge_outputs`](conform_core::merge_outputs); an incompatible pair
//! turns the whole result into one type issue with no per-field detail.
//!
//! Under `abort_early` the first option with an issue ends evaluation.
//! The async schema launches every option at once and merges the outputs
//! in declaration order regardless of completion order.

use std::sync::Arc;

use conform_core::{
    merge_outputs, schema_issue, ParseSettings, SchemaError, SchemaKind, SchemaResult, Value,
};
use conform_pipe::{Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{Aggregate, Flow};
use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

fn merge_all(outputs: impl IntoIterator<Item = Value>) -> Option<Value> {
    let mut outputs = outputs.into_iter();
    let first = outputs.next()?;
    outputs.try_fold(first, |merged, next| merge_outputs(&merged, &next))
}

fn merge_failure(settings: &ParseSettings, message: &str, input: &Value) -> SchemaResult {
    tracing::debug!("intersection outputs could not be merged");
    schema_issue(settings, SchemaKind::Intersect, message, input, None)
}

#[derive(Debug, Clone)]
pub struct IntersectSchema {
    options: Vec<SchemaRef>,
    message: String,
    pipe: Pipe,
}

impl IntersectSchema {
    /// Fails with [`SchemaError::NoOptions`] when `options` is empty.
    pub fn new(options: impl IntoIterator<Item = SchemaRef>) -> Result<Self, SchemaError> {
        let options: Vec<_> = options.into_iter().collect();
        if options.is_empty() {
            return Err(SchemaError::NoOptions { schema: "intersect" });
        }
        Ok(Self {
            options,
            message: INVALID_TYPE.to_string(),
            pipe: Pipe::new(),
        })
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

impl SchemaNode for IntersectSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Intersect
    }
}

impl Schema for IntersectSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let mut agg = Aggregate::new();
        let mut outputs = Vec::with_capacity(self.options.len());
        for option in &self.options {
            match agg.absorb_unpathed(option.parse(input, settings), settings) {
                Flow::Continue { output, .. } => outputs.push(output),
                Flow::Abort => break,
            }
        }

        if !agg.is_typed() {
            return agg.into_result(Value::Undefined);
        }
        match merge_all(outputs) {
            Some(merged) => agg.finish(merged, &self.pipe, settings, SchemaKind::Intersect),
            None => merge_failure(settings, &self.message, input),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntersectSchemaAsync {
    options: Vec<AsyncSchemaRef>,
    message: String,
    pipe: PipeAsync,
}

impl IntersectSchemaAsync {
    pub fn new(options: impl IntoIterator<Item = AsyncSchemaRef>) -> Result<Self, SchemaError> {
        let options: Vec<_> = options.into_iter().collect();
        if options.is_empty() {
            return Err(SchemaError::NoOptions { schema: "intersect" });
        }
        Ok(Self {
            options,
            message: INVALID_TYPE.to_string(),
            pipe: PipeAsync::new(),
        })
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

impl SchemaNode for IntersectSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Intersect
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for IntersectSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let mut pending: FuturesUnordered<_> = self
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| option.parse_async(input, settings).map(move |r| (index, r)))
                .collect();

            let mut agg = Aggregate::new();
            let mut slots: Vec<Option<Value>> = vec![None; self.options.len()];
            while let Some((index, result)) = pending.next().await {
                match agg.absorb_unpathed(result, settings) {
                    Flow::Continue { output, .. } => slots[index] = Some(output),
                    Flow::Abort => {
                        tracing::trace!(abandoned = pending.len(), "intersection aborted early");
                        break;
                    }
                }
            }
            drop(pending);

            if !agg.is_typed() {
                return agg.into_result(Value::Undefined);
            }
            match merge_all(slots.into_iter().flatten()) {
                Some(merged) => {
                    agg.finish_async(merged, &self.pipe, settings, SchemaKind::Intersect)
                        .await
                }
                None => merge_failure(settings, &self.message, input),
            }
        }
        .boxed()
    }
}

pub fn intersect(options: impl IntoIterator<Item = SchemaRef>) -> Result<IntersectSchema, SchemaError> {
    IntersectSchema::new(options)
}

pub fn intersect_async(
    options: impl IntoIterator<Item = AsyncSchemaRef>,
) -> Result<IntersectSchemaAsync, SchemaError> {
    IntersectSchemaAsync::new(options)
}
