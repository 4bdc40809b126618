//! # Union Schema
//!
//! Tries each option in declaration order and commits to the first one that
//! produces no issues. Outputs are never merged. When every option fails,
//! the union reports a single type issue carrying every option's issues as
//! nested detail, in the order the options were tried.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, SchemaError, SchemaKind, SchemaResult, Value};
use conform_pipe::{run_pipe, run_pipe_async, Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};

use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

#[derive(Debug, Clone)]
pub struct UnionSchema {
    options: Vec<SchemaRef>,
    message: String,
    pipe: Pipe,
}

impl UnionSchema {
    /// Fails with [`SchemaError::NoOptions`] when `options` is empty.
    pub fn new(options: impl IntoIterator<Item = SchemaRef>) -> Result<Self, SchemaError> {
        let options: Vec<_> = options.into_iter().collect();
        if options.is_empty() {
            return Err(SchemaError::NoOptions { schema: "union" });
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

    pub fn options(&self) -> &[SchemaRef] {
        &self.options
    }
}

impl SchemaNode for UnionSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Union
    }
}

impl Schema for UnionSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let mut failed = Vec::new();
        for option in &self.options {
            let result = option.parse(input, settings);
            if result.is_valid() {
                return run_pipe(result.output, &self.pipe, settings, SchemaKind::Union, Vec::new());
            }
            failed.extend(result.issues);
        }
        schema_issue(settings, SchemaKind::Union, &self.message, input, Some(failed))
    }
}

/// Async union. Options are still tried one at a time so that the first
/// success in declaration order wins.
#[derive(Debug, Clone)]
pub struct UnionSchemaAsync {
    options: Vec<AsyncSchemaRef>,
    message: String,
    pipe: PipeAsync,
}

impl UnionSchemaAsync {
    pub fn new(options: impl IntoIterator<Item = AsyncSchemaRef>) -> Result<Self, SchemaError> {
        let options: Vec<_> = options.into_iter().collect();
        if options.is_empty() {
            return Err(SchemaError::NoOptions { schema: "union" });
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

impl SchemaNode for UnionSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Union
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for UnionSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let mut failed = Vec::new();
            for option in &self.options {
                let result = option.parse_async(input, settings).await;
                if result.is_valid() {
                    return run_pipe_async(result.output, &self.pipe, settings, SchemaKind::Union, Vec::new())
                        .await;
                }
                failed.extend(result.issues);
            }
            schema_issue(settings, SchemaKind::Union, &self.message, input, Some(failed))
        }
        .boxed()
    }
}

pub fn union(options: impl IntoIterator<Item = SchemaRef>) -> Result<UnionSchema, SchemaError> {
    UnionSchema::new(options)
}

pub fn union_async(
    options: impl IntoIterator<Item = AsyncSchemaRef>,
) -> Result<UnionSchemaAsync, SchemaError> {
    UnionSchemaAsync::new(options)
}
