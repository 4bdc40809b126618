//! # Schema Traits
//!
//! Every schema, from `string()` to a nested variant, is driven through one
//! method: [`Schema::parse`] for the synchronous tree and
//! [`AsyncSchema::parse_async`] for the asynchronous tree.
//!
//! ## Design
//!
//! - [`SchemaNode`] carries the discriminant every node exposes: its
//!   [`SchemaKind`] and whether it needs to be awaited.
//! - Every sync schema is also an async schema through a blanket impl, so
//!   sync children compose freely into async parents. The reverse is not
//!   possible: an async child forces an async parent.
//! - Children are held as [`SchemaRef`] / [`AsyncSchemaRef`] so one
//!   sub-schema may be shared by many parents and across threads.
//!
//! A schema tree is immutable once built and parse calls never mutate it.

use std::fmt;
use std::sync::Arc;

use conform_core::{ParseSettings, SchemaKind, SchemaResult, Value};
use futures_util::future::{self, BoxFuture, FutureExt};

/// Metadata shared by sync and async schemas.
pub trait SchemaNode: fmt::Debug + Send + Sync {
    /// Discriminant of this schema.
    fn kind(&self) -> SchemaKind;

    /// Whether parsing needs to be awaited.
    fn is_async(&self) -> bool {
        false
    }
}

/// A synchronous schema.
pub trait Schema: SchemaNode {
    /// Validate and transform `input`.
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult;

    /// Move this schema behind a shareable handle.
    fn shared(self) -> SchemaRef
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// An asynchronous schema.
pub trait AsyncSchema: SchemaNode {
    /// Validate and transform `input`, awaiting async children and steps.
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult>;

    /// Move this schema behind a shareable handle.
    fn shared_async(self) -> AsyncSchemaRef
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

pub type SchemaRef = Arc<dyn Schema>;
pub type AsyncSchemaRef = Arc<dyn AsyncSchema>;

impl<S: Schema + ?Sized> AsyncSchema for S {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        future::ready(self.parse(input, settings)).boxed()
    }
}

impl<T: SchemaNode + ?Sized> SchemaNode for Arc<T> {
    fn kind(&self) -> SchemaKind {
        (**self).kind()
    }

    fn is_async(&self) -> bool {
        (**self).is_async()
    }
}

impl Schema for SchemaRef {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        (**self).parse(input, settings)
    }

    fn shared(self) -> SchemaRef {
        self
    }
}

impl AsyncSchema for AsyncSchemaRef {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        (**self).parse_async(input, settings)
    }

    fn shared_async(self) -> AsyncSchemaRef {
        self
    }
}

/// Use a shared sync schema where an async one is expected.
pub fn lift_schema(schema: SchemaRef) -> AsyncSchemaRef {
    Arc::new(schema)
}
