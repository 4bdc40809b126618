//! # Wrapper Schemas
//!
//! Schemas that delegate to one wrapped schema, with a contract decided by
//! whether the input is one of the nullish values.
//!
//! - [`OptionalSchema`] (`optional`, `nullable`, `nullish`): when the input
//!   is the handled nullish value, substitute a configured default and
//!   validate it against the wrapped schema, or succeed with the input as-is
//!   when no default resolves. Other inputs go to the wrapped schema.
//! - [`NonOptionalSchema`] (`non_optional`, `non_nullable`, `non_nullish`):
//!   reject the nullish value with a `"type"` issue, otherwise delegate.
//!
//! ## Defaults
//!
//! "No default" is an explicit `None`, so falsy defaults such as `0` or
//! `""` are honored. A producer is called on every substitution and never
//! memoized. A default that resolves to `Undefined` counts as no default.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, SchemaKind, SchemaResult, Value};
use futures_util::future::{BoxFuture, FutureExt};

use crate::leaf::INVALID_TYPE;
use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

/// Which nullish values a wrapper handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// `Undefined` only.
    Optional,
    /// `Null` only.
    Nullable,
    /// `Undefined` or `Null`.
    Nullish,
}

impl Presence {
    fn matches(self, input: &Value) -> bool {
        match self {
            Self::Optional => input.is_undefined(),
            Self::Nullable => input.is_null(),
            Self::Nullish => input.is_nullish(),
        }
    }

    fn kind(self) -> SchemaKind {
        match self {
            Self::Optional => SchemaKind::Optional,
            Self::Nullable => SchemaKind::Nullable,
            Self::Nullish => SchemaKind::Nullish,
        }
    }

    fn inverse_kind(self) -> SchemaKind {
        match self {
            Self::Optional => SchemaKind::NonOptional,
            Self::Nullable => SchemaKind::NonNullable,
            Self::Nullish => SchemaKind::NonNullish,
        }
    }
}

type Producer = Arc<dyn Fn() -> Value + Send + Sync>;
type AsyncProducer = Arc<dyn Fn() -> BoxFuture<'static, Value> + Send + Sync>;

/// Default substituted by a sync wrapper.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Producer(Producer),
}

impl DefaultValue {
    pub(crate) fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer"),
        }
    }
}

/// Default substituted by an async wrapper.
#[derive(Clone)]
pub enum DefaultValueAsync {
    Value(Value),
    Producer(Producer),
    AsyncProducer(AsyncProducer),
}

impl DefaultValueAsync {
    pub(crate) async fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Producer(produce) => produce(),
            Self::AsyncProducer(produce) => produce().await,
        }
    }
}

impl fmt::Debug for DefaultValueAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer"),
            Self::AsyncProducer(_) => f.write_str("AsyncProducer"),
        }
    }
}

impl From<DefaultValue> for DefaultValueAsync {
    fn from(default: DefaultValue) -> Self {
        match default {
            DefaultValue::Value(value) => Self::Value(value),
            DefaultValue::Producer(produce) => Self::Producer(produce),
        }
    }
}

// ─── Optional / Nullable / Nullish ──────────────────────────────────

/// Accepts a nullish value, optionally replacing it by a default.
#[derive(Debug, Clone)]
pub struct OptionalSchema {
    presence: Presence,
    wrapped: SchemaRef,
    default: Option<DefaultValue>,
}

impl OptionalSchema {
    pub fn new(presence: Presence, wrapped: impl Schema + 'static) -> Self {
        Self {
            presence,
            wrapped: wrapped.shared(),
            default: None,
        }
    }

    /// Substitute `value` for the handled nullish input.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Substitute the result of `produce`, called on every substitution.
    pub fn default_with<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(produce)));
        self
    }

    pub fn wrapped(&self) -> &SchemaRef {
        &self.wrapped
    }

    /// The default as currently resolved; `None` when none is configured.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(DefaultValue::resolve)
    }
}

impl SchemaNode for OptionalSchema {
    fn kind(&self) -> SchemaKind {
        self.presence.kind()
    }
}

impl Schema for OptionalSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        if !self.presence.matches(input) {
            return self.wrapped.parse(input, settings);
        }
        match self.default.as_ref().map(DefaultValue::resolve) {
            Some(value) if !value.is_undefined() => self.wrapped.parse(&value, settings),
            _ => SchemaResult::typed(input.clone()),
        }
    }
}

/// Async mirror of [`OptionalSchema`]; the default may be awaited.
#[derive(Debug, Clone)]
pub struct OptionalSchemaAsync {
    presence: Presence,
    wrapped: AsyncSchemaRef,
    default: Option<DefaultValueAsync>,
}

impl OptionalSchemaAsync {
    pub fn new(presence: Presence, wrapped: impl AsyncSchema + 'static) -> Self {
        Self {
            presence,
            wrapped: wrapped.shared_async(),
            default: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValueAsync::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValueAsync::Producer(Arc::new(produce)));
        self
    }

    /// Substitute the awaited result of `produce`.
    pub fn default_async<F, Fut>(mut self, produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.default = Some(DefaultValueAsync::AsyncProducer(Arc::new(move || {
            produce().boxed()
        })));
        self
    }

    pub fn wrapped(&self) -> &AsyncSchemaRef {
        &self.wrapped
    }
}

impl SchemaNode for OptionalSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.presence.kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for OptionalSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            if !self.presence.matches(input) {
                return self.wrapped.parse_async(input, settings).await;
            }
            let value = match &self.default {
                Some(default) => default.resolve().await,
                None => Value::Undefined,
            };
            if value.is_undefined() {
                SchemaResult::typed(input.clone())
            } else {
                self.wrapped.parse_async(&value, settings).await
            }
        }
        .boxed()
    }
}

// ─── NonOptional / NonNullable / NonNullish ─────────────────────────

/// Rejects a nullish value before delegating.
#[derive(Debug, Clone)]
pub struct NonOptionalSchema {
    presence: Presence,
    wrapped: SchemaRef,
    message: String,
}

impl NonOptionalSchema {
    pub fn new(presence: Presence, wrapped: impl Schema + 'static) -> Self {
        Self {
            presence,
            wrapped: wrapped.shared(),
            message: INVALID_TYPE.to_string(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl SchemaNode for NonOptionalSchema {
    fn kind(&self) -> SchemaKind {
        self.presence.inverse_kind()
    }
}

impl Schema for NonOptionalSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        if self.presence.matches(input) {
            return schema_issue(settings, self.kind(), &self.message, input, None);
        }
        self.wrapped.parse(input, settings)
    }
}

#[derive(Debug, Clone)]
pub struct NonOptionalSchemaAsync {
    presence: Presence,
    wrapped: AsyncSchemaRef,
    message: String,
}

impl NonOptionalSchemaAsync {
    pub fn new(presence: Presence, wrapped: impl AsyncSchema + 'static) -> Self {
        Self {
            presence,
            wrapped: wrapped.shared_async(),
            message: INVALID_TYPE.to_string(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl SchemaNode for NonOptionalSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.presence.inverse_kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for NonOptionalSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        if self.presence.matches(input) {
            let result = schema_issue(settings, self.kind(), &self.message, input, None);
            return futures_util::future::ready(result).boxed();
        }
        self.wrapped.parse_async(input, settings)
    }
}

// ─── Constructors ───────────────────────────────────────────────────

pub fn optional(wrapped: impl Schema + 'static) -> OptionalSchema {
    OptionalSchema::new(Presence::Optional, wrapped)
}

pub fn nullable(wrapped: impl Schema + 'static) -> OptionalSchema {
    OptionalSchema::new(Presence::Nullable, wrapped)
}

pub fn nullish(wrapped: impl Schema + 'static) -> OptionalSchema {
    OptionalSchema::new(Presence::Nullish, wrapped)
}

pub fn optional_async(wrapped: impl AsyncSchema + 'static) -> OptionalSchemaAsync {
    OptionalSchemaAsync::new(Presence::Optional, wrapped)
}

pub fn nullable_async(wrapped: impl AsyncSchema + 'static) -> OptionalSchemaAsync {
    OptionalSchemaAsync::new(Presence::Nullable, wrapped)
}

pub fn nullish_async(wrapped: impl AsyncSchema + 'static) -> OptionalSchemaAsync {
    OptionalSchemaAsync::new(Presence::Nullish, wrapped)
}

pub fn non_optional(wrapped: impl Schema + 'static) -> NonOptionalSchema {
    NonOptionalSchema::new(Presence::Optional, wrapped)
}

pub fn non_nullable(wrapped: impl Schema + 'static) -> NonOptionalSchema {
    NonOptionalSchema::new(Presence::Nullable, wrapped)
}

pub fn non_nullish(wrapped: impl Schema + 'static) -> NonOptionalSchema {
    NonOptionalSchema::new(Presence::Nullish, wrapped)
}

pub fn non_optional_async(wrapped: impl AsyncSchema + 'static) -> NonOptionalSchemaAsync {
    NonOptionalSchemaAsync::new(Presence::Optional, wrapped)
}

pub fn non_nullable_async(wrapped: impl AsyncSchema + 'static) -> NonOptionalSchemaAsync {
    NonOptionalSchemaAsync::new(Presence::Nullable, wrapped)
}

pub fn non_nullish_async(wrapped: impl AsyncSchema + 'static) -> NonOptionalSchemaAsync {
    NonOptionalSchemaAsync::new(Presence::Nullish, wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{number, string, string_async};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parse(schema: &impl Schema, input: impl Into<Value>) -> SchemaResult {
        schema.parse(&input.into(), &ParseSettings::default())
    }

    #[test]
    fn test_optional_without_default_bypasses_wrapped() {
        let result = parse(&optional(string()), Value::Undefined);
        assert!(result.is_valid());
        assert!(result.output.is_undefined());
        assert!(!parse(&optional(string()), Value::Null).typed);
    }

    #[test]
    fn test_optional_default_substitution() {
        let schema = optional(string()).default("fallback");
        assert_eq!(parse(&schema, Value::Undefined).output, Value::from("fallback"));
        assert_eq!(parse(&schema, "given").output, Value::from("given"));
        let result = parse(&schema, 123);
        assert!(!result.typed);
        assert_eq!(result.issues[0].kind, "type");
        assert_eq!(schema.default_value(), Some(Value::from("fallback")));
    }

    #[test]
    fn test_falsy_default_is_honored() {
        let schema = optional(number()).default(0);
        assert_eq!(parse(&schema, Value::Undefined).output, Value::from(0));
    }

    #[test]
    fn test_default_is_validated() {
        let schema = optional(number()).default("nope");
        assert!(!parse(&schema, Value::Undefined).typed);
    }

    #[test]
    fn test_producer_called_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = nullable(number()).default_with(move || {
            Value::from(counter.fetch_add(1, Ordering::SeqCst) as u32)
        });
        assert_eq!(parse(&schema, Value::Null).output, Value::from(0));
        assert_eq!(parse(&schema, Value::Null).output, Value::from(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_producer_returning_undefined_bypasses() {
        let schema = nullable(number()).default_with(|| Value::Undefined);
        let result = parse(&schema, Value::Null);
        assert!(result.is_valid());
        assert_eq!(result.output, Value::Null);
    }

    #[test]
    fn test_nullish_handles_both() {
        let schema = nullish(string());
        assert!(parse(&schema, Value::Null).is_valid());
        assert!(parse(&schema, Value::Undefined).is_valid());
        assert_eq!(schema.kind(), SchemaKind::Nullish);
    }

    #[test]
    fn test_non_wrappers_reject() {
        let result = parse(&non_optional(optional(string())), Value::Undefined);
        assert!(!result.typed);
        assert_eq!(result.issues[0].schema, SchemaKind::NonOptional);
        assert!(parse(&non_nullable(nullable(string())), "x").is_valid());
        assert!(!parse(&non_nullable(nullable(string())), Value::Null).typed);
        assert!(!parse(&non_nullish(nullish(string())), Value::Undefined).typed);
        assert!(parse(&non_nullish(nullish(string())), "x").is_valid());
    }

    #[tokio::test]
    async fn test_async_default_is_awaited() {
        let schema = optional_async(string_async()).default_async(|| async { Value::from("later") });
        let result = schema.parse_async(&Value::Undefined, &ParseSettings::default()).await;
        assert_eq!(result.output, Value::from("later"));
        assert!(schema.is_async());
    }

    #[tokio::test]
    async fn test_async_non_nullish() {
        let schema = non_nullish_async(string());
        let settings = ParseSettings::default();
        assert!(!schema.parse_async(&Value::Null, &settings).await.typed);
        assert!(schema.parse_async(&Value::from("x"), &settings).await.is_valid());
    }
}
