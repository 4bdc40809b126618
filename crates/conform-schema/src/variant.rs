//! # Variant Schema
//!
//! A discriminated union. Each option is either an object schema that
//! declares an entry for the discriminator key, or a nested variant on the
//! same key.
//!
//! ## Dispatch
//!
//! The input must be an object holding the key. Options are searched depth
//! first, validating only the discriminator entry's schema against the
//! input's key value. The first option whose discriminator validates without
//! issues is committed to: its full object schema runs against the whole
//! input and that result is returned as is. No later option is tried, even
//! when the committed option fails. When no discriminator matches the
//! variant reports a type issue.
//!
//! ## Construction
//!
//! Option shape is checked once when the variant is built and reported as a
//! [`SchemaError`]; dispatch never probes option structure.

use std::sync::Arc;

use conform_core::{schema_issue, ParseSettings, SchemaError, SchemaKind, SchemaResult, Value};
use conform_pipe::{lift, run_pipe, run_pipe_async, Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};

use crate::leaf::INVALID_TYPE;
use crate::object::{ObjectSchema, ObjectSchemaAsync};
use crate::schema::{AsyncSchema, Schema, SchemaNode};

/// One candidate of a [`VariantSchema`].
#[derive(Debug, Clone)]
pub enum VariantOption {
    Object(Arc<ObjectSchema>),
    Variant(Arc<VariantSchema>),
}

impl From<ObjectSchema> for VariantOption {
    fn from(schema: ObjectSchema) -> Self {
        Self::Object(Arc::new(schema))
    }
}

impl From<VariantSchema> for VariantOption {
    fn from(schema: VariantSchema) -> Self {
        Self::Variant(Arc::new(schema))
    }
}

fn check_options<O>(
    key: &str,
    options: &[O],
    describe: impl Fn(&O) -> OptionShape<'_>,
) -> Result<(), SchemaError> {
    if options.is_empty() {
        return Err(SchemaError::NoOptions { schema: "variant" });
    }
    for (index, option) in options.iter().enumerate() {
        match describe(option) {
            OptionShape::Object { has_key: false } => {
                return Err(SchemaError::MissingDiscriminator {
                    key: key.to_string(),
                    index,
                })
            }
            OptionShape::Variant { key: nested } if nested != key => {
                return Err(SchemaError::DiscriminatorMismatch {
                    expected: key.to_string(),
                    found: nested.to_string(),
                })
            }
            _ => {}
        }
    }
    Ok(())
}

enum OptionShape<'a> {
    Object { has_key: bool },
    Variant { key: &'a str },
}

/// The discriminator value, when the input is an object holding the key.
fn discriminant<'v>(input: &'v Value, key: &str) -> Option<&'v Value> {
    input.as_object().and_then(|map| map.get(key))
}

// ─── Sync ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VariantSchema {
    key: String,
    options: Vec<VariantOption>,
    message: String,
    pipe: Pipe,
}

impl VariantSchema {
    pub fn new(
        key: impl Into<String>,
        options: impl IntoIterator<Item = VariantOption>,
    ) -> Result<Self, SchemaError> {
        let key = key.into();
        let options: Vec<_> = options.into_iter().collect();
        check_options(&key, &options, |option| match option {
            VariantOption::Object(schema) => OptionShape::Object {
                has_key: schema.has_entry(&key),
            },
            VariantOption::Variant(schema) => OptionShape::Variant { key: &schema.key },
        })?;
        Ok(Self {
            key,
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

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &[VariantOption] {
        &self.options
    }

    /// Depth-first search for the first option whose discriminator accepts
    /// `value`.
    fn select(&self, value: &Value, settings: &ParseSettings) -> Option<&ObjectSchema> {
        self.options.iter().find_map(|option| match option {
            VariantOption::Object(schema) => {
                let entry = schema.entry_schema(&self.key)?;
                entry.parse(value, settings).is_valid().then_some(&**schema)
            }
            VariantOption::Variant(nested) => nested.select(value, settings),
        })
    }
}

impl SchemaNode for VariantSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Variant
    }
}

impl Schema for VariantSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        let Some(value) = discriminant(input, &self.key) else {
            return schema_issue(settings, SchemaKind::Variant, &self.message, input, None);
        };
        let Some(option) = self.select(value, settings) else {
            return schema_issue(settings, SchemaKind::Variant, &self.message, input, None);
        };

        tracing::trace!(key = %self.key, discriminant = %value, "variant committed to option");
        let result = option.parse(input, settings);
        if !result.typed {
            return result;
        }
        run_pipe(result.output, &self.pipe, settings, SchemaKind::Variant, result.issues)
    }
}

// ─── Async ──────────────────────────────────────────────────────────

/// One candidate of a [`VariantSchemaAsync`].
#[derive(Debug, Clone)]
pub enum VariantOptionAsync {
    Object(Arc<ObjectSchemaAsync>),
    Variant(Arc<VariantSchemaAsync>),
}

impl From<ObjectSchemaAsync> for VariantOptionAsync {
    fn from(schema: ObjectSchemaAsync) -> Self {
        Self::Object(Arc::new(schema))
    }
}

impl From<ObjectSchema> for VariantOptionAsync {
    fn from(schema: ObjectSchema) -> Self {
        Self::Object(Arc::new(schema.into()))
    }
}

impl From<VariantSchemaAsync> for VariantOptionAsync {
    fn from(schema: VariantSchemaAsync) -> Self {
        Self::Variant(Arc::new(schema))
    }
}

impl From<VariantSchema> for VariantOptionAsync {
    fn from(schema: VariantSchema) -> Self {
        Self::Variant(Arc::new(schema.into()))
    }
}

impl From<VariantOption> for VariantOptionAsync {
    fn from(option: VariantOption) -> Self {
        match option {
            VariantOption::Object(schema) => Self::Object(Arc::new((*schema).clone().into())),
            VariantOption::Variant(schema) => Self::Variant(Arc::new((*schema).clone().into())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariantSchemaAsync {
    key: String,
    options: Vec<VariantOptionAsync>,
    message: String,
    pipe: PipeAsync,
}

impl VariantSchemaAsync {
    pub fn new(
        key: impl Into<String>,
        options: impl IntoIterator<Item = VariantOptionAsync>,
    ) -> Result<Self, SchemaError> {
        let key = key.into();
        let options: Vec<_> = options.into_iter().collect();
        check_options(&key, &options, |option| match option {
            VariantOptionAsync::Object(schema) => OptionShape::Object {
                has_key: schema.has_entry(&key),
            },
            VariantOptionAsync::Variant(schema) => OptionShape::Variant { key: &schema.key },
        })?;
        Ok(Self {
            key,
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

    pub fn key(&self) -> &str {
        &self.key
    }

    fn select<'a>(
        &'a self,
        value: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, Option<&'a ObjectSchemaAsync>> {
        async move {
            for option in &self.options {
                match option {
                    VariantOptionAsync::Object(schema) => {
                        let Some(entry) = schema.entry_schema(&self.key) else { continue };
                        if entry.parse_async(value, settings).await.is_valid() {
                            return Some(&**schema);
                        }
                    }
                    VariantOptionAsync::Variant(nested) => {
                        if let Some(schema) = nested.select(value, settings).await {
                            return Some(schema);
                        }
                    }
                }
            }
            None
        }
        .boxed()
    }
}

impl From<VariantSchema> for VariantSchemaAsync {
    fn from(schema: VariantSchema) -> Self {
        Self {
            key: schema.key,
            options: schema.options.into_iter().map(VariantOptionAsync::from).collect(),
            message: schema.message,
            pipe: schema.pipe.into_iter().map(lift).collect(),
        }
    }
}

impl SchemaNode for VariantSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Variant
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for VariantSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            let Some(value) = discriminant(input, &self.key) else {
                return schema_issue(settings, SchemaKind::Variant, &self.message, input, None);
            };
            let Some(option) = self.select(value, settings).await else {
                return schema_issue(settings, SchemaKind::Variant, &self.message, input, None);
            };

            tracing::trace!(key = %self.key, discriminant = %value, "variant committed to option");
            let result = option.parse_async(input, settings).await;
            if !result.typed {
                return result;
            }
            run_pipe_async(result.output, &self.pipe, settings, SchemaKind::Variant, result.issues).await
        }
        .boxed()
    }
}

// ─── Constructors ───────────────────────────────────────────────────

pub fn variant(
    key: impl Into<String>,
    options: impl IntoIterator<Item = VariantOption>,
) -> Result<VariantSchema, SchemaError> {
    VariantSchema::new(key, options)
}

pub fn variant_async(
    key: impl Into<String>,
    options: impl IntoIterator<Item = VariantOptionAsync>,
) -> Result<VariantSchemaAsync, SchemaError> {
    VariantSchemaAsync::new(key, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{literal, literal_async, number, string};
    use crate::object::{object, object_async};
    use conform_pipe::check_async;
    use serde_json::json;

    fn shapes() -> VariantSchema {
        variant(
            "type",
            [
                object().entry("type", literal("circle")).entry("r", number()).into(),
                object().entry("type", literal("square")).entry("side", number()).into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dispatches_on_discriminator() {
        let input = Value::from(json!({"type": "square", "side": 2}));
        let result = shapes().parse(&input, &ParseSettings::default());
        assert!(result.is_valid());
        assert_eq!(result.output, input);
    }

    #[test]
    fn test_committed_option_failure_is_returned() {
        let input = Value::from(json!({"type": "circle", "r": "big"}));
        let result = shapes().parse(&input, &ParseSettings::default());
        assert!(!result.typed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].schema, SchemaKind::Number);
        assert_eq!(result.issues[0].path.to_string(), "r");
    }

    #[test]
    fn test_no_fallback_after_commit() {
        let schema = variant(
            "kind",
            [
                object().entry("kind", string()).entry("n", number()).into(),
                object().entry("kind", string()).entry("s", string()).into(),
            ],
        )
        .unwrap();
        let result = schema.parse(&Value::from(json!({"kind": "x", "s": "ok"})), &ParseSettings::default());
        assert!(!result.typed);
        assert_eq!(result.issues[0].path.to_string(), "n");
    }

    #[test]
    fn test_missing_key_or_unknown_discriminator() {
        let settings = ParseSettings::default();
        for input in [json!({"side": 2}), json!({"type": "hexagon"}), json!(["square"])] {
            let result = shapes().parse(&Value::from(input), &settings);
            assert_eq!(result.issues.len(), 1);
            assert_eq!(result.issues[0].schema, SchemaKind::Variant);
            assert!(result.issues[0].is_type_issue());
        }
    }

    #[test]
    fn test_nested_variant_is_searched_depth_first() {
        let nested = variant(
            "type",
            [object().entry("type", literal("b")).entry("b", number()).into()],
        )
        .unwrap();
        let schema = variant(
            "type",
            [
                object().entry("type", literal("a")).into(),
                nested.into(),
                object().entry("type", literal("b")).entry("c", string()).into(),
            ],
        )
        .unwrap();
        let result = schema.parse(&Value::from(json!({"type": "b", "b": 1})), &ParseSettings::default());
        assert!(result.is_valid());
    }

    #[test]
    fn test_construction_errors() {
        let missing = variant("type", [object().entry("kind", string()).into()]).unwrap_err();
        assert_eq!(
            missing,
            SchemaError::MissingDiscriminator {
                key: "type".into(),
                index: 0
            }
        );

        let nested = variant("kind", [object().entry("kind", string()).into()]).unwrap();
        let mismatch = variant("type", [nested.into()]).unwrap_err();
        assert!(matches!(mismatch, SchemaError::DiscriminatorMismatch { .. }));

        assert!(matches!(
            variant("type", Vec::new()),
            Err(SchemaError::NoOptions { schema: "variant" })
        ));
    }

    #[tokio::test]
    async fn test_async_from_sync() {
        let schema = VariantSchemaAsync::from(shapes());
        assert!(schema.is_async());
        let input = Value::from(json!({"type": "circle", "r": 1}));
        let result = schema.parse_async(&input, &ParseSettings::default()).await;
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn test_async_discriminator() {
        let option = object_async()
            .entry("type", literal_async("a").step(check_async("known", "Unknown", |_| async { true })));
        let schema = variant_async("type", [option.into(), object().entry("type", literal("b")).into()]).unwrap();
        let result = schema.parse_async(&Value::from(json!({"type": "b"})), &ParseSettings::default()).await;
        assert!(result.is_valid());
    }
}
