//! # conform-schema: Composable Validation Schemas
//!
//! Every schema implements one contract: given an untyped
//! [`Value`](conform_core::Value) and [`ParseSettings`](conform_core::ParseSettings),
//! return a [`SchemaResult`](conform_core::SchemaResult) that records the
//! output, whether it is typed, and every issue found with its path from
//! the root.
//!
//! ## Schema Families
//!
//! - **Leaf** (`leaf`): `string`, `number`, `literal`, `picklist`, ... A
//!   type check followed by the schema's pipe.
//! - **Wrapper** (`wrapper`): `optional`, `nullable`, `nullish` and their
//!   `non_*` inverses.
//! - **Structural** (`object`, `array`, `tuple`, `record`, `map`, `set`):
//!   validate each child position, prepend one path item to every child
//!   issue, and honor `abort_early`.
//! - **Combinator** (`union`, `intersect`, `variant`): alternation and
//!   merging across candidate schemas.
//! - **Recursive** (`recursive`): lazy self-reference.
//! - **Methods** (`methods`): `parse`, `coerce`, `fallback`, `with_default`
//!   and the object key policies.
//!
//! ## Sync and Async
//!
//! Each schema has an `*Async` mirror whose children may be async and whose
//! pipe may hold async steps. Sync schemas are usable anywhere an async one
//! is expected. Async structural schemas launch every child before awaiting
//! any; outputs keep positional order while issues follow completion order.
//!
//! ## Example
//!
//! ```
//! use conform_core::{ParseSettings, Value};
//! use conform_pipe::validations::min_length;
//! use conform_schema::{array, number, object, parse, string};
//!
//! let schema = object()
//!     .entry("name", string().step(min_length(1)))
//!     .entry("scores", array(number()));
//!
//! let input = Value::from(serde_json::json!({"name": "ada", "scores": [1, "x"]}));
//! let err = parse(&schema, &input, &ParseSettings::default()).unwrap_err();
//! assert_eq!(err.issues()[0].path.to_string(), "scores[1]");
//! ```
//!
//! ## Crate Policy
//!
//! - Schema trees are immutable after construction and `Send + Sync`.
//! - Misconfigured combinators are rejected at construction with
//!   [`SchemaError`](conform_core::SchemaError), never at parse time.
//! - No `panic!()` or `.unwrap()` outside tests.

mod aggregate;

pub mod array;
pub mod intersect;
pub mod leaf;
pub mod map;
pub mod methods;
pub mod object;
pub mod record;
pub mod recursive;
pub mod schema;
pub mod set;
pub mod tuple;
pub mod union;
pub mod variant;
pub mod wrapper;

pub use array::{array, array_async, ArraySchema, ArraySchemaAsync};
pub use intersect::{intersect, intersect_async, IntersectSchema, IntersectSchemaAsync};
pub use leaf::{
    any, any_async, bigint, bigint_async, blob, blob_async, boolean, boolean_async, date,
    date_async, enum_, enum_async, instance, instance_async, literal, literal_async, nan,
    nan_async, never, never_async, null, null_async, number, number_async, picklist,
    picklist_async, special, special_async, string, string_async, symbol, symbol_async,
    undefined, undefined_async, unknown, unknown_async, void, void_async, LeafCheck, LeafSchema,
    LeafSchemaAsync,
};
pub use map::{map, map_async, MapSchema, MapSchemaAsync};
pub use methods::{
    coerce, coerce_async, fallback, fallback_async, fallback_with, fallback_with_async, parse,
    parse_async, passthrough, passthrough_async, strict, strict_async, strip, strip_async,
    with_default, with_default_async, with_default_from, with_default_from_async,
    CoerceSchema, CoerceSchemaAsync, FallbackInfo, FallbackSchema, FallbackSchemaAsync,
    FallbackValue, ObjectPolicySchema, WithDefaultSchema, WithDefaultSchemaAsync,
};
pub use object::{object, object_async, ObjectSchema, ObjectSchemaAsync};
pub use record::{
    record, record_async, record_with_key, record_with_key_async, RecordSchema,
    RecordSchemaAsync, BLOCKED_KEYS,
};
pub use recursive::{recursive, recursive_async, RecursiveSchema, RecursiveSchemaAsync};
pub use schema::{lift_schema, AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};
pub use set::{set, set_async, SetSchema, SetSchemaAsync};
pub use tuple::{tuple, tuple_async, TupleSchema, TupleSchemaAsync};
pub use union::{union, union_async, UnionSchema, UnionSchemaAsync};
pub use variant::{
    variant, variant_async, VariantOption, VariantOptionAsync, VariantSchema, VariantSchemaAsync,
};
pub use wrapper::{
    non_nullable, non_nullable_async, non_nullish, non_nullish_async, non_optional,
    non_optional_async, nullable, nullable_async, nullish, nullish_async, optional,
    optional_async, DefaultValue, DefaultValueAsync, NonOptionalSchema, NonOptionalSchemaAsync,
    OptionalSchema, OptionalSchemaAsync, Presence,
};
