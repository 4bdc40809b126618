//! # Schema Kinds
//!
//! Every schema reports a [`SchemaKind`] discriminant. Issues record the kind
//! of the schema that produced them, and the variant schema inspects option
//! kinds instead of probing option structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant naming the concrete kind of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Any,
    Unknown,
    Never,
    String,
    Number,
    Bigint,
    Boolean,
    Date,
    Symbol,
    Undefined,
    Null,
    Void,
    Nan,
    Literal,
    Picklist,
    Enum,
    Instance,
    Blob,
    Special,
    Optional,
    Nullable,
    Nullish,
    NonOptional,
    NonNullable,
    NonNullish,
    Object,
    Array,
    Tuple,
    Record,
    Map,
    Set,
    Union,
    Intersect,
    Variant,
    Recursive,
    Strict,
}

impl SchemaKind {
    /// The snake_case tag used in issue records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Never => "never",
            Self::String => "string",
            Self::Number => "number",
            Self::Bigint => "bigint",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Symbol => "symbol",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Void => "void",
            Self::Nan => "nan",
            Self::Literal => "literal",
            Self::Picklist => "picklist",
            Self::Enum => "enum",
            Self::Instance => "instance",
            Self::Blob => "blob",
            Self::Special => "special",
            Self::Optional => "optional",
            Self::Nullable => "nullable",
            Self::Nullish => "nullish",
            Self::NonOptional => "non_optional",
            Self::NonNullable => "non_nullable",
            Self::NonNullish => "non_nullish",
            Self::Object => "object",
            Self::Array => "array",
            Self::Tuple => "tuple",
            Self::Record => "record",
            Self::Map => "map",
            Self::Set => "set",
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Variant => "variant",
            Self::Recursive => "recursive",
            Self::Strict => "strict",
        }
    }

    /// Whether schemas of this kind validate child positions.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Object | Self::Array | Self::Tuple | Self::Record | Self::Map | Self::Set
        )
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde() {
        for kind in [SchemaKind::NonOptional, SchemaKind::Object, SchemaKind::Intersect] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn test_structural_kinds() {
        assert!(SchemaKind::Record.is_structural());
        assert!(SchemaKind::Set.is_structural());
        assert!(!SchemaKind::Union.is_structural());
        assert!(!SchemaKind::String.is_structural());
    }
}
