//! # Leaf Schemas
//!
//! Primitive schemas: a cheap type or identity check followed by the
//! schema's own pipe. A failed check yields one `"type"` issue; pipe issues
//! surface at the leaf's own depth with no path item added.
//!
//! Every leaf exists in a sync form ([`LeafSchema`]) and an async form
//! ([`LeafSchemaAsync`]). They share the same [`LeafCheck`]; only the pipe
//! type differs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use conform_core::{schema_issue, Instance, ParseSettings, SchemaKind, SchemaResult, Value};
use conform_pipe::{run_pipe, run_pipe_async, Action, AsyncAction, Pipe, PipeAsync};
use futures_util::future::{BoxFuture, FutureExt};

use crate::schema::{AsyncSchema, Schema, SchemaNode};

pub(crate) const INVALID_TYPE: &str = "Invalid type";

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The type check a leaf performs before its pipe.
#[derive(Clone)]
pub enum LeafCheck {
    Any,
    Unknown,
    Never,
    String,
    /// Any number except NaN.
    Number,
    BigInt,
    Boolean,
    /// A valid date.
    Date,
    Symbol,
    Undefined,
    Null,
    Void,
    Nan,
    /// Strict equality with one value.
    Literal(Value),
    /// One of a fixed set of strings.
    Picklist(Vec<String>),
    /// One of a fixed set of values, compared strictly.
    Enum(Vec<Value>),
    /// A host object of one concrete type.
    Instance {
        test: fn(&Instance) -> bool,
        type_name: &'static str,
    },
    Blob,
    /// Arbitrary predicate.
    Special(Predicate),
}

impl fmt::Debug for LeafCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Picklist(options) => f.debug_tuple("Picklist").field(options).finish(),
            Self::Enum(values) => f.debug_tuple("Enum").field(values).finish(),
            Self::Instance { type_name, .. } => f.debug_tuple("Instance").field(type_name).finish(),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

fn is_instance<T: Any>(value: &Instance) -> bool {
    value.is::<T>()
}

impl LeafCheck {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Any => SchemaKind::Any,
            Self::Unknown => SchemaKind::Unknown,
            Self::Never => SchemaKind::Never,
            Self::String => SchemaKind::String,
            Self::Number => SchemaKind::Number,
            Self::BigInt => SchemaKind::Bigint,
            Self::Boolean => SchemaKind::Boolean,
            Self::Date => SchemaKind::Date,
            Self::Symbol => SchemaKind::Symbol,
            Self::Undefined => SchemaKind::Undefined,
            Self::Null => SchemaKind::Null,
            Self::Void => SchemaKind::Void,
            Self::Nan => SchemaKind::Nan,
            Self::Literal(_) => SchemaKind::Literal,
            Self::Picklist(_) => SchemaKind::Picklist,
            Self::Enum(_) => SchemaKind::Enum,
            Self::Instance { .. } => SchemaKind::Instance,
            Self::Blob => SchemaKind::Blob,
            Self::Special(_) => SchemaKind::Special,
        }
    }

    /// Whether `input` passes the type check.
    pub fn accepts(&self, input: &Value) -> bool {
        match self {
            Self::Any | Self::Unknown => true,
            Self::Never => false,
            Self::String => matches!(input, Value::String(_)),
            Self::Number => matches!(input, Value::Number(n) if !n.is_nan()),
            Self::BigInt => matches!(input, Value::BigInt(_)),
            Self::Boolean => matches!(input, Value::Bool(_)),
            Self::Date => matches!(input, Value::Date(Some(_))),
            Self::Symbol => matches!(input, Value::Symbol(_)),
            Self::Undefined | Self::Void => input.is_undefined(),
            Self::Null => input.is_null(),
            Self::Nan => matches!(input, Value::Number(n) if n.is_nan()),
            Self::Literal(literal) => input.strict_eq(literal),
            Self::Picklist(options) => input
                .as_str()
                .is_some_and(|s| options.iter().any(|option| option == s)),
            Self::Enum(values) => values.iter().any(|value| input.strict_eq(value)),
            Self::Instance { test, .. } => matches!(input, Value::Instance(i) if test(i)),
            Self::Blob => matches!(input, Value::Blob(_)),
            Self::Special(predicate) => predicate(input),
        }
    }
}

// ─── Sync ───────────────────────────────────────────────────────────

/// A primitive schema with a synchronous pipe.
#[derive(Debug, Clone)]
pub struct LeafSchema {
    check: LeafCheck,
    message: String,
    pipe: Pipe,
}

impl LeafSchema {
    pub fn new(check: LeafCheck) -> Self {
        Self {
            check,
            message: INVALID_TYPE.to_string(),
            pipe: Pipe::new(),
        }
    }

    /// Replace the type-check message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the pipe.
    pub fn pipe(mut self, pipe: Pipe) -> Self {
        self.pipe = pipe;
        self
    }

    /// Append one step to the pipe.
    pub fn step(mut self, step: impl Action + 'static) -> Self {
        self.pipe.push(Arc::new(step));
        self
    }

    pub fn check(&self) -> &LeafCheck {
        &self.check
    }
}

impl SchemaNode for LeafSchema {
    fn kind(&self) -> SchemaKind {
        self.check.kind()
    }
}

impl Schema for LeafSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        if !self.check.accepts(input) {
            return schema_issue(settings, self.kind(), &self.message, input, None);
        }
        run_pipe(input.clone(), &self.pipe, settings, self.kind(), Vec::new())
    }
}

// ─── Async ──────────────────────────────────────────────────────────

/// A primitive schema whose pipe may contain async steps.
#[derive(Debug, Clone)]
pub struct LeafSchemaAsync {
    check: LeafCheck,
    message: String,
    pipe: PipeAsync,
}

impl LeafSchemaAsync {
    pub fn new(check: LeafCheck) -> Self {
        Self {
            check,
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

    /// Append one step, sync or async, to the pipe.
    pub fn step(mut self, step: impl AsyncAction + 'static) -> Self {
        self.pipe.push(Arc::new(step));
        self
    }

    pub fn check(&self) -> &LeafCheck {
        &self.check
    }
}

impl SchemaNode for LeafSchemaAsync {
    fn kind(&self) -> SchemaKind {
        self.check.kind()
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for LeafSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        async move {
            if !self.check.accepts(input) {
                return schema_issue(settings, self.kind(), &self.message, input, None);
            }
            run_pipe_async(input.clone(), &self.pipe, settings, self.kind(), Vec::new()).await
        }
        .boxed()
    }
}

// ─── Constructors ───────────────────────────────────────────────────

macro_rules! leaf_constructors {
    ($($(#[$doc:meta])* $name:ident, $name_async:ident => $check:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name() -> LeafSchema {
                LeafSchema::new(LeafCheck::$check)
            }

            $(#[$doc])*
            pub fn $name_async() -> LeafSchemaAsync {
                LeafSchemaAsync::new(LeafCheck::$check)
            }
        )*
    };
}

leaf_constructors! {
    /// Accepts every value.
    any, any_async => Any;
    /// Accepts every value.
    unknown, unknown_async => Unknown;
    /// Rejects every value.
    never, never_async => Never;
    string, string_async => String;
    /// Numbers other than NaN.
    number, number_async => Number;
    bigint, bigint_async => BigInt;
    boolean, boolean_async => Boolean;
    /// Valid dates only.
    date, date_async => Date;
    symbol, symbol_async => Symbol;
    undefined, undefined_async => Undefined;
    null, null_async => Null;
    void, void_async => Void;
    nan, nan_async => Nan;
    blob, blob_async => Blob;
}

pub fn literal(value: impl Into<Value>) -> LeafSchema {
    LeafSchema::new(LeafCheck::Literal(value.into()))
}

pub fn literal_async(value: impl Into<Value>) -> LeafSchemaAsync {
    LeafSchemaAsync::new(LeafCheck::Literal(value.into()))
}

pub fn picklist<I, S>(options: I) -> LeafSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    LeafSchema::new(LeafCheck::Picklist(options.into_iter().map(Into::into).collect()))
}

pub fn picklist_async<I, S>(options: I) -> LeafSchemaAsync
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    LeafSchemaAsync::new(LeafCheck::Picklist(options.into_iter().map(Into::into).collect()))
}

/// Accepts any of `values`. Trailing underscore because `enum` is reserved.
pub fn enum_<I, V>(values: I) -> LeafSchema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    LeafSchema::new(LeafCheck::Enum(values.into_iter().map(Into::into).collect()))
}

pub fn enum_async<I, V>(values: I) -> LeafSchemaAsync
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    LeafSchemaAsync::new(LeafCheck::Enum(values.into_iter().map(Into::into).collect()))
}

fn instance_check<T: Any>() -> LeafCheck {
    LeafCheck::Instance {
        test: is_instance::<T>,
        type_name: std::any::type_name::<T>(),
    }
}

/// Accepts [`Value::Instance`] wrapping a `T`.
pub fn instance<T: Any>() -> LeafSchema {
    LeafSchema::new(instance_check::<T>())
}

pub fn instance_async<T: Any>() -> LeafSchemaAsync {
    LeafSchemaAsync::new(instance_check::<T>())
}

/// Accepts values for which `predicate` returns true.
pub fn special<F>(predicate: F) -> LeafSchema
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    LeafSchema::new(LeafCheck::Special(Arc::new(predicate)))
}

pub fn special_async<F>(predicate: F) -> LeafSchemaAsync
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    LeafSchemaAsync::new(LeafCheck::Special(Arc::new(predicate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use conform_core::Symbol;
    use conform_pipe::validations::{min_length, min_value};
    use conform_pipe::{check_async, transformations::to_upper_case};

    fn ok(schema: &LeafSchema, input: impl Into<Value>) -> bool {
        schema.parse(&input.into(), &ParseSettings::default()).is_valid()
    }

    #[test]
    fn test_string_check() {
        assert!(ok(&string(), "a"));
        let result = string().parse(&Value::from(1), &ParseSettings::default());
        assert!(!result.typed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "type");
        assert_eq!(result.issues[0].schema, SchemaKind::String);
        assert_eq!(result.issues[0].message, "Invalid type");
    }

    #[test]
    fn test_number_rejects_nan() {
        assert!(ok(&number(), 1.5));
        assert!(!ok(&number(), f64::NAN));
        assert!(ok(&nan(), f64::NAN));
        assert!(!ok(&nan(), 1));
    }

    #[test]
    fn test_date_rejects_invalid() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert!(ok(&super::date(), date));
        assert!(!ok(&super::date(), Value::Date(None)));
    }

    #[test]
    fn test_nullish_leaves() {
        assert!(ok(&undefined(), Value::Undefined));
        assert!(ok(&void(), Value::Undefined));
        assert!(!ok(&undefined(), Value::Null));
        assert!(ok(&null(), Value::Null));
        assert_eq!(void().kind(), SchemaKind::Void);
    }

    #[test]
    fn test_any_unknown_never() {
        assert!(ok(&any(), Value::Null));
        assert!(ok(&unknown(), Value::Undefined));
        assert!(!ok(&never(), Value::Undefined));
    }

    #[test]
    fn test_literal_picklist_enum() {
        assert!(ok(&literal(1), 1));
        assert!(!ok(&literal(1), "1"));
        assert!(!ok(&literal(f64::NAN), f64::NAN));
        assert!(ok(&picklist(["a", "b"]), "b"));
        assert!(!ok(&picklist(["a", "b"]), "c"));
        assert!(ok(&enum_([Value::from("x"), Value::from(2)]), 2));
        assert!(!ok(&enum_([Value::from("x"), Value::from(2)]), "2"));
    }

    #[test]
    fn test_symbol_blob_bigint_boolean() {
        assert!(ok(&symbol(), Symbol::new("s")));
        assert!(ok(&blob(), Value::Blob(vec![1])));
        assert!(ok(&bigint(), Value::BigInt(1)));
        assert!(!ok(&bigint(), 1));
        assert!(ok(&boolean(), false));
    }

    #[test]
    fn test_instance() {
        #[derive(Debug)]
        struct Point;
        #[derive(Debug)]
        struct Line;
        assert!(ok(&instance::<Point>(), Instance::new(Point)));
        assert!(!ok(&instance::<Point>(), Instance::new(Line)));
        assert!(!ok(&instance::<Point>(), Value::Null));
    }

    #[test]
    fn test_special() {
        let even = special(|v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0));
        assert!(ok(&even, 4));
        assert!(!ok(&even, 3));
        assert_eq!(even.kind(), SchemaKind::Special);
    }

    #[test]
    fn test_pipe_runs_after_type_check() {
        let schema = string().step(min_length(3)).step(to_upper_case());
        let result = schema.parse(&Value::from("abc"), &ParseSettings::default());
        assert_eq!(result.output, Value::from("ABC"));

        let result = schema.parse(&Value::from("ab"), &ParseSettings::default());
        assert!(result.typed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "min_length");
        assert_eq!(result.issues[0].schema, SchemaKind::String);
    }

    #[test]
    fn test_custom_message() {
        let result = number().message("Expected a number").parse(&Value::Null, &ParseSettings::default());
        assert_eq!(result.issues[0].message, "Expected a number");
    }

    #[tokio::test]
    async fn test_async_leaf_awaits_steps() {
        let schema = number_async()
            .step(min_value(0))
            .step(check_async("even", "Must be even", |v: Value| async move {
                v.as_f64().is_some_and(|n| n % 2.0 == 0.0)
            }));
        assert!(schema.is_async());
        let settings = ParseSettings::default();
        assert!(schema.parse_async(&Value::from(4), &settings).await.is_valid());
        let result = schema.parse_async(&Value::from(3), &settings).await;
        assert!(result.typed);
        assert_eq!(result.issues[0].kind, "even");
        let result = schema.parse_async(&Value::from("4"), &settings).await;
        assert!(!result.typed);
    }
}
