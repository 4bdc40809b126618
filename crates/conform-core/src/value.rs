//! # Value Model
//!
//! [`Value`] is the untyped, already-deserialized input every schema accepts
//! and the output every schema produces. It covers the runtime kinds a schema
//! can discriminate on: the nullish pair (`Undefined`, `Null`), scalars,
//! identity-bearing values (`Symbol`, `Instance`), dates, binary blobs, and
//! the four container kinds (array, object, map, set).
//!
//! ## Equality
//!
//! Two notions of equality exist side by side:
//!
//! - `PartialEq` is structural and is what tests compare outputs with.
//! - [`Value::strict_eq`] is the identity-style equality literal schemas and
//!   output merging use: NaN never equals itself, scalars compare by value,
//!   symbols and instances by pointer, and containers are never equal.
//!
//! ## Serialization
//!
//! `Value` implements `Serialize` so issue lists can be rendered as JSON.
//! The mapping is lossy: `Undefined` serializes as `null`, dates as RFC 3339
//! strings (or `null` when invalid), maps as arrays of `[key, value]` pairs,
//! blobs as byte arrays, symbols by description and instances by type name.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

/// Insertion-ordered property bag backing [`Value::Object`].
pub type Object = IndexMap<String, Value>;

/// A unique, identity-compared token with a human-readable description.
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(description: impl AsRef<str>) -> Self {
        Self(Arc::from(description.as_ref()))
    }

    pub fn description(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// An opaque host object, checked by instance-of schemas via its concrete type.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether the wrapped object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

/// An arbitrary in-memory value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    /// IEEE-754 double; NaN is representable and has its own schema.
    Number(f64),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    /// `None` is an invalid date.
    Date(Option<DateTime<Utc>>),
    Blob(Vec<u8>),
    Array(Vec<Value>),
    Object(Object),
    /// Insertion-ordered entries with unique keys.
    Map(Vec<(Value, Value)>),
    /// Insertion-ordered unique elements.
    Set(Vec<Value>),
    Instance(Instance),
}

impl Value {
    /// Runtime kind name used in messages and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Date(_) => "date",
            Self::Blob(_) => "blob",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Instance(_) => "instance",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` or `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Property lookup; absent keys and non-objects read as `Undefined`.
    pub fn get(&self, key: &str) -> &Value {
        static UNDEFINED: Value = Value::Undefined;
        match self {
            Self::Object(map) => map.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Identity-style equality (see module docs).
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Instance(a), Self::Instance(b)) => a == b,
            (Self::Date(Some(a)), Self::Date(Some(b))) => a == b,
            _ => false,
        }
    }

    /// Like [`Value::strict_eq`] except that NaN equals NaN. Used for map key
    /// and set element uniqueness.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_eq(other),
        }
    }

    /// Insert into map entries, replacing the value of an existing equal key.
    pub fn map_insert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
        match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Append to set elements unless an equal element is already present.
    pub fn set_insert(items: &mut Vec<Value>, value: Value) {
        if !items.iter().any(|item| item.same_value_zero(&value)) {
            items.push(value);
        }
    }

    /// String form of a value used as an object property name.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Lossy conversion back to JSON (see module docs for the mapping).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => fmt_number(*n, f),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::String(s) => f.write_str(s),
            Self::Symbol(s) => write!(f, "Symbol({})", s.description()),
            Self::Date(Some(d)) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Date(None) => f.write_str("Invalid Date"),
            Self::Blob(bytes) => write!(f, "Blob({} bytes)", bytes.len()),
            Self::Array(items) => write!(f, "Array({})", items.len()),
            Self::Object(_) => f.write_str("Object"),
            Self::Map(entries) => write!(f, "Map({})", entries.len()),
            Self::Set(items) => write!(f, "Set({})", items.len()),
            Self::Instance(i) => write!(f, "Instance({})", i.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null | Self::Date(None) => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => serializer.serialize_i128(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Symbol(s) => serializer.serialize_str(s.description()),
            Self::Date(Some(d)) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Blob(bytes) => serializer.collect_seq(bytes),
            Self::Array(items) | Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Self::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (k, v) in entries {
                    seq.serialize_element(&(k, v))?;
                }
                seq.end()
            }
            Self::Instance(i) => serializer.serialize_str(i.type_name()),
        }
    }
}

// ─── Conversions ────────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Self::Object(map)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(Some(date))
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_nested() {
        let value = Value::from(json!({"b": 1, "a": [true, null, "x"]}));
        assert_eq!(value.as_object().map(|m| m.len()), Some(2));
        assert_eq!(
            value.get("a"),
            &Value::Array(vec![Value::Bool(true), Value::Null, Value::from("x")])
        );
        assert_eq!(value.get("b"), &Value::Number(1.0));
    }

    #[test]
    fn test_get_absent_key_is_undefined() {
        let value = Value::from(json!({"a": 1}));
        assert!(value.get("missing").is_undefined());
        assert!(Value::Null.get("a").is_undefined());
    }

    #[test]
    fn test_strict_eq_nan() {
        let nan = Value::Number(f64::NAN);
        assert!(!nan.strict_eq(&nan));
        assert!(nan.same_value_zero(&nan));
        assert_ne!(nan, Value::Number(f64::NAN));
    }

    #[test]
    fn test_strict_eq_containers_never_equal() {
        let a = Value::Array(vec![]);
        assert!(!a.strict_eq(&a.clone()));
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_symbol_identity() {
        let a = Symbol::new("id");
        let b = Symbol::new("id");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(Value::from(a.clone()).strict_eq(&Value::from(a)));
    }

    #[test]
    fn test_instance_downcast_and_identity() {
        #[derive(Debug)]
        struct Widget(u8);
        let w = Instance::new(Widget(7));
        assert!(w.is::<Widget>());
        assert!(!w.is::<String>());
        assert_eq!(w.downcast_ref::<Widget>().map(|w| w.0), Some(7));
        assert_eq!(w, w.clone());
        assert_ne!(w, Instance::new(Widget(7)));
    }

    #[test]
    fn test_map_insert_replaces_existing_key() {
        let mut entries = Vec::new();
        Value::map_insert(&mut entries, Value::from("k"), Value::from(1));
        Value::map_insert(&mut entries, Value::from("k"), Value::from(2));
        assert_eq!(entries, vec![(Value::from("k"), Value::from(2))]);
    }

    #[test]
    fn test_set_insert_dedups_scalars_only() {
        let mut items = Vec::new();
        Value::set_insert(&mut items, Value::from(1));
        Value::set_insert(&mut items, Value::from(1));
        Value::set_insert(&mut items, Value::Array(vec![]));
        Value::set_insert(&mut items, Value::Array(vec![]));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(2.0).to_key_string(), "2");
    }

    #[test]
    fn test_to_json_lossy() {
        let value: Value = [
            ("u", Value::Undefined),
            ("m", Value::Map(vec![(Value::from("k"), Value::from(1))])),
        ]
        .into_iter()
        .collect();
        assert_eq!(value.to_json(), json!({"u": null, "m": [["k", 1.0]]}));
    }
}
