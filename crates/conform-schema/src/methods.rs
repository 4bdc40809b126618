//! # Methods
//!
//! Entry points and adapters layered over the schema contract.
//!
//! ## Entry Points
//!
//! [`parse`] and [`parse_async`] run a schema and turn any issue into a
//! [`ValidationError`] carrying the complete issue list.
//!
//! ## Adapters
//!
//! Every adapter is itself a schema and reports the kind of the schema it
//! wraps, so it composes anywhere the wrapped schema could appear:
//!
//! - [`coerce`]: rewrite the input before validating it.
//! - [`fallback`]: replace any failing result by a fixed or computed value.
//! - [`with_default`]: substitute a value for an `Undefined` input.
//! - [`passthrough`], [`strict`], [`strip`]: unknown-key policies for
//!   object schemas, applied only to results without issues.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use conform_core::{Issue, ParseSettings, SchemaKind, SchemaResult, ValidationError, Value};
use futures_util::future::{BoxFuture, FutureExt};

use crate::object::{ObjectSchema, ObjectSchemaAsync};
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};
use crate::wrapper::{DefaultValue, DefaultValueAsync};

// ─── Parse ──────────────────────────────────────────────────────────

fn conclude(kind: SchemaKind, result: SchemaResult) -> Result<Value, ValidationError> {
    if result.has_issues() {
        tracing::debug!(schema = %kind, issues = result.issues.len(), "validation failed");
    }
    result.into_result()
}

/// Validate `input`, returning the output or every issue found.
pub fn parse<S>(schema: &S, input: &Value, settings: &ParseSettings) -> Result<Value, ValidationError>
where
    S: Schema + ?Sized,
{
    conclude(schema.kind(), schema.parse(input, settings))
}

/// Async mirror of [`parse`].
pub async fn parse_async<S>(
    schema: &S,
    input: &Value,
    settings: &ParseSettings,
) -> Result<Value, ValidationError>
where
    S: AsyncSchema + ?Sized,
{
    conclude(schema.kind(), schema.parse_async(input, settings).await)
}

// ─── Coerce ─────────────────────────────────────────────────────────

type Coercion = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
type AsyncCoercion = Arc<dyn Fn(Value) -> BoxFuture<'static, Value> + Send + Sync>;

#[derive(Clone)]
pub struct CoerceSchema {
    schema: SchemaRef,
    action: Coercion,
}

impl fmt::Debug for CoerceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoerceSchema").field("schema", &self.schema).finish_non_exhaustive()
    }
}

impl SchemaNode for CoerceSchema {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }
}

impl Schema for CoerceSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let coerced = (self.action)(input);
        self.schema.parse(&coerced, settings)
    }
}

#[derive(Clone)]
pub struct CoerceSchemaAsync {
    schema: AsyncSchemaRef,
    action: AsyncCoercion,
}

impl fmt::Debug for CoerceSchemaAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoerceSchemaAsync").field("schema", &self.schema).finish_non_exhaustive()
    }
}

impl SchemaNode for CoerceSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for CoerceSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let coerced = (self.action)(input.clone()).await;
            self.schema.parse_async(&coerced, settings).await
        }
        .boxed()
    }
}

/// Apply `action` to every input before `schema` sees it.
pub fn coerce<F>(schema: impl Schema + 'static, action: F) -> CoerceSchema
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    CoerceSchema {
        schema: schema.shared(),
        action: Arc::new(action),
    }
}

pub fn coerce_async<F, Fut>(schema: impl AsyncSchema + 'static, action: F) -> CoerceSchemaAsync
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    CoerceSchemaAsync {
        schema: schema.shared_async(),
        action: Arc::new(move |input| action(input).boxed()),
    }
}

// ─── Fallback ───────────────────────────────────────────────────────

/// What a fallback producer is told about the failed parse.
#[derive(Debug, Clone)]
pub struct FallbackInfo {
    pub input: Value,
    pub issues: Vec<Issue>,
}

type FallbackProducer = Arc<dyn Fn(FallbackInfo) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum FallbackValue {
    Value(Value),
    Producer(FallbackProducer),
}

impl FallbackValue {
    fn resolve(&self, input: &Value, issues: Vec<Issue>) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Producer(produce) => produce(FallbackInfo {
                input: input.clone(),
                issues,
            }),
        }
    }
}

impl fmt::Debug for FallbackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer"),
        }
    }
}

fn recover(result: SchemaResult, input: &Value, fallback: &FallbackValue) -> SchemaResult {
    if result.has_issues() {
        SchemaResult::typed(fallback.resolve(input, result.issues))
    } else {
        result
    }
}

#[derive(Debug, Clone)]
pub struct FallbackSchema {
    schema: SchemaRef,
    fallback: FallbackValue,
}

impl SchemaNode for FallbackSchema {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }
}

impl Schema for FallbackSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        recover(self.schema.parse(input, settings), input, &self.fallback)
    }
}

#[derive(Debug, Clone)]
pub struct FallbackSchemaAsync {
    schema: AsyncSchemaRef,
    fallback: FallbackValue,
}

impl SchemaNode for FallbackSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for FallbackSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        self.schema
            .parse_async(input, settings)
            .map(move |result| recover(result, input, &self.fallback))
            .boxed()
    }
}

/// Succeed with `value` whenever `schema` reports any issue.
pub fn fallback(schema: impl Schema + 'static, value: impl Into<Value>) -> FallbackSchema {
    FallbackSchema {
        schema: schema.shared(),
        fallback: FallbackValue::Value(value.into()),
    }
}

/// Succeed with `produce(info)` whenever `schema` reports any issue.
pub fn fallback_with<F>(schema: impl Schema + 'static, produce: F) -> FallbackSchema
where
    F: Fn(FallbackInfo) -> Value + Send + Sync + 'static,
{
    FallbackSchema {
        schema: schema.shared(),
        fallback: FallbackValue::Producer(Arc::new(produce)),
    }
}

pub fn fallback_async(schema: impl AsyncSchema + 'static, value: impl Into<Value>) -> FallbackSchemaAsync {
    FallbackSchemaAsync {
        schema: schema.shared_async(),
        fallback: FallbackValue::Value(value.into()),
    }
}

pub fn fallback_with_async<F>(schema: impl AsyncSchema + 'static, produce: F) -> FallbackSchemaAsync
where
    F: Fn(FallbackInfo) -> Value + Send + Sync + 'static,
{
    FallbackSchemaAsync {
        schema: schema.shared_async(),
        fallback: FallbackValue::Producer(Arc::new(produce)),
    }
}

// ─── With default ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WithDefaultSchema {
    schema: SchemaRef,
    default: DefaultValue,
}

impl SchemaNode for WithDefaultSchema {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }
}

impl Schema for WithDefaultSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        if input.is_undefined() {
            self.schema.parse(&self.default.resolve(), settings)
        } else {
            self.schema.parse(input, settings)
        }
    }
}

#[derive(Debug, Clone)]
pub struct WithDefaultSchemaAsync {
    schema: AsyncSchemaRef,
    default: DefaultValueAsync,
}

impl SchemaNode for WithDefaultSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for WithDefaultSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            if input.is_undefined() {
                let value = self.default.resolve().await;
                self.schema.parse_async(&value, settings).await
            } else {
                self.schema.parse_async(input, settings).await
            }
        }
        .boxed()
    }
}

/// Validate `value` in place of an `Undefined` input.
pub fn with_default(schema: impl Schema + 'static, value: impl Into<Value>) -> WithDefaultSchema {
    WithDefaultSchema {
        schema: schema.shared(),
        default: DefaultValue::Value(value.into()),
    }
}

/// Validate `produce()` in place of an `Undefined` input.
pub fn with_default_from<F>(schema: impl Schema + 'static, produce: F) -> WithDefaultSchema
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    WithDefaultSchema {
        schema: schema.shared(),
        default: DefaultValue::Producer(Arc::new(produce)),
    }
}

pub fn with_default_async(
    schema: impl AsyncSchema + 'static,
    value: impl Into<Value>,
) -> WithDefaultSchemaAsync {
    WithDefaultSchemaAsync {
        schema: schema.shared_async(),
        default: DefaultValueAsync::Value(value.into()),
    }
}

pub fn with_default_from_async<F, Fut>(
    schema: impl AsyncSchema + 'static,
    produce: F,
) -> WithDefaultSchemaAsync
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    WithDefaultSchemaAsync {
        schema: schema.shared_async(),
        default: DefaultValueAsync::AsyncProducer(Arc::new(move || produce().boxed())),
    }
}

// ─── Unknown-key policies ───────────────────────────────────────────

const INVALID_KEYS: &str = "Invalid keys";

#[derive(Debug, Clone)]
enum Policy {
    Passthrough,
    Strict { message: String },
    Strip,
}

impl Policy {
    fn apply(
        &self,
        has_entry: impl Fn(&str) -> bool,
        input: &Value,
        result: SchemaResult,
        settings: &ParseSettings,
    ) -> SchemaResult {
        if result.has_issues() {
            return result;
        }
        let Value::Object(map) = input else {
            return result;
        };
        match self {
            Self::Passthrough => {
                let mut output = map.clone();
                if let Value::Object(validated) = result.output {
                    output.extend(validated);
                }
                SchemaResult::typed(Value::Object(output))
            }
            Self::Strict { message } => {
                if map.keys().all(|key| has_entry(key)) {
                    return result;
                }
                let issue = Issue::new(settings, "object", SchemaKind::Strict, message.clone(), input.clone());
                SchemaResult::untyped(Value::Undefined, vec![issue])
            }
            Self::Strip => match result.output {
                Value::Object(validated) => SchemaResult::typed(Value::Object(
                    validated.into_iter().filter(|(key, _)| has_entry(key)).collect(),
                )),
                other => SchemaResult::typed(other),
            },
        }
    }
}

/// An object schema with an unknown-key policy applied to its valid results.
#[derive(Debug, Clone)]
pub struct ObjectPolicySchema<O> {
    object: O,
    policy: Policy,
}

impl<O> ObjectPolicySchema<O> {
    /// Override the message of a strict policy's issue. No effect on other
    /// policies.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Policy::Strict { message: current } = &mut self.policy {
            *current = message.into();
        }
        self
    }

    pub fn object(&self) -> &O {
        &self.object
    }
}

impl<O: SchemaNode> SchemaNode for ObjectPolicySchema<O> {
    fn kind(&self) -> SchemaKind {
        self.object.kind()
    }

    fn is_async(&self) -> bool {
        self.object.is_async()
    }
}

impl Schema for ObjectPolicySchema<ObjectSchema> {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let result = self.object.parse(input, settings);
        self.policy.apply(|key| self.object.has_entry(key), input, result, settings)
    }
}

impl AsyncSchema for ObjectPolicySchema<ObjectSchemaAsync> {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let result = self.object.parse_async(input, settings).await;
            self.policy.apply(|key| self.object.has_entry(key), input, result, settings)
        }
        .boxed()
    }
}

/// Keep unknown input keys in the output, overlaid by validated entries.
pub fn passthrough(object: ObjectSchema) -> ObjectPolicySchema<ObjectSchema> {
    ObjectPolicySchema {
        object,
        policy: Policy::Passthrough,
    }
}

/// Reject inputs carrying keys the object does not declare.
pub fn strict(object: ObjectSchema) -> ObjectPolicySchema<ObjectSchema> {
    ObjectPolicySchema {
        object,
        policy: Policy::Strict {
            message: INVALID_KEYS.to_string(),
        },
    }
}

/// Keep only declared keys in the output.
pub fn strip(object: ObjectSchema) -> ObjectPolicySchema<ObjectSchema> {
    ObjectPolicySchema {
        object,
        policy: Policy::Strip,
    }
}

pub fn passthrough_async(object: ObjectSchemaAsync) -> ObjectPolicySchema<ObjectSchemaAsync> {
    ObjectPolicySchema {
        object,
        policy: Policy::Passthrough,
    }
}

pub fn strict_async(object: ObjectSchemaAsync) -> ObjectPolicySchema<ObjectSchemaAsync> {
    ObjectPolicySchema {
        object,
        policy: Policy::Strict {
            message: INVALID_KEYS.to_string(),
        },
    }
}

pub fn strip_async(object: ObjectSchemaAsync) -> ObjectPolicySchema<ObjectSchemaAsync> {
    ObjectPolicySchema {
        object,
        policy: Policy::Strip,
    }
}
