//! # Recursive Schema
//!
//! Breaks reference cycles in self-describing shapes such as trees. The
//! schema holds a getter instead of a child; the getter runs on every parse
//! and the parse is delegated entirely to the schema it returns. Results of
//! the getter are not cached, so it may build a fresh schema each call.
//!
//! ```
//! use conform_core::{ParseSettings, Value};
//! use conform_schema::{array, number, object, recursive, Schema, SchemaRef};
//!
//! fn node() -> SchemaRef {
//!     object()
//!         .entry("value", number())
//!         .entry("children", array(recursive(node)))
//!         .shared()
//! }
//!
//! let tree = Value::from(serde_json::json!({
//!     "value": 1,
//!     "children": [{"value": 2, "children": []}]
//! }));
//! assert!(node().parse(&tree, &ParseSettings::default()).is_valid());
//! ```

use std::fmt;
use std::sync::Arc;

use conform_core::{ParseSettings, SchemaKind, SchemaResult, Value};
use futures_util::future::BoxFuture;

use crate::schema::{AsyncSchema, AsyncSchemaRef, Schema, SchemaNode, SchemaRef};

type Getter = Arc<dyn Fn() -> SchemaRef + Send + Sync>;
type AsyncGetter = Arc<dyn Fn() -> AsyncSchemaRef + Send + Sync>;

#[derive(Clone)]
pub struct RecursiveSchema {
    getter: Getter,
}

impl RecursiveSchema {
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> SchemaRef + Send + Sync + 'static,
    {
        Self {
            getter: Arc::new(getter),
        }
    }

    /// Resolve the schema this one delegates to.
    pub fn resolve(&self) -> SchemaRef {
        (self.getter)()
    }
}

impl fmt::Debug for RecursiveSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecursiveSchema")
    }
}

impl SchemaNode for RecursiveSchema {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Recursive
    }
}

impl Schema for RecursiveSchema {
    fn parse(&self, input: &Value, settings: &ParseSettings) -> SchemaResult {
        self.resolve().parse(input, settings)
    }
}

#[derive(Clone)]
pub struct RecursiveSchemaAsync {
    getter: AsyncGetter,
}

impl RecursiveSchemaAsync {
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> AsyncSchemaRef + Send + Sync + 'static,
    {
        Self {
            getter: Arc::new(getter),
        }
    }

    pub fn resolve(&self) -> AsyncSchemaRef {
        (self.getter)()
    }
}

impl fmt::Debug for RecursiveSchemaAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecursiveSchemaAsync")
    }
}

impl SchemaNode for RecursiveSchemaAsync {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Recursive
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl AsyncSchema for RecursiveSchemaAsync {
    fn parse_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, SchemaResult> {
        let schema = self.resolve();
        Box::pin(async move { schema.parse_async(input, settings).await })
    }
}

pub fn recursive<F>(getter: F) -> RecursiveSchema
where
    F: Fn() -> SchemaRef + Send + Sync + 'static,
{
    RecursiveSchema::new(getter)
}

pub fn recursive_async<F>(getter: F) -> RecursiveSchemaAsync
where
    F: Fn() -> AsyncSchemaRef + Send + Sync + 'static,
{
    RecursiveSchemaAsync::new(getter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{array, array_async};
    use crate::leaf::{number, string};
    use crate::object::{object, object_async};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node() -> SchemaRef {
        object()
            .entry("value", number())
            .entry("children", array(recursive(node)))
            .shared()
    }

    fn node_async() -> AsyncSchemaRef {
        object_async()
            .entry("value", number())
            .entry("children", array_async(recursive_async(node_async)))
            .shared_async()
    }

    fn tree(leaf: serde_json::Value) -> Value {
        Value::from(json!({
            "value": 1,
            "children": [{"value": 2, "children": [{"value": leaf, "children": []}]}]
        }))
    }

    #[test]
    fn test_recursive_tree() {
        let settings = ParseSettings::default();
        assert!(node().parse(&tree(json!(3)), &settings).is_valid());

        let result = node().parse(&tree(json!("x")), &settings);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].path.to_string(), "children[0].children[0].value");
    }

    #[test]
    fn test_getter_runs_every_parse() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let schema = recursive(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            string().shared()
        });
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        let settings = ParseSettings::default();
        schema.parse(&Value::from("a"), &settings);
        schema.parse(&Value::from("b"), &settings);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(schema.kind(), SchemaKind::Recursive);
    }

    #[tokio::test]
    async fn test_async_recursive_tree() {
        let settings = ParseSettings::default();
        let result = node_async().parse_async(&tree(json!("x")), &settings).await;
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].path.to_string(), "children[0].children[0].value");
    }
}
