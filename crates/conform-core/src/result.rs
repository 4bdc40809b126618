//! # Schema Results
//!
//! The outcome of one parse attempt. Two shapes exist:
//!
//! - **Typed**: `typed == true`, a trusted `output`, and possibly non-fatal
//!   issues (pipe refinements that failed on a structurally valid value).
//! - **Untyped**: `typed == false`, a best-effort `output` for diagnostics
//!   only, and a non-empty issue list.
//!
//! A result is *valid* when it carries no issues at all. Union, variant,
//! fallback and the top-level `parse` method all decide on validity, not on
//! `typed`; structural schemas decide on `typed` whether to run their own pipe.

use crate::error::ValidationError;
use crate::issue::Issue;
use crate::kind::SchemaKind;
use crate::settings::ParseSettings;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaResult {
    pub typed: bool,
    pub output: Value,
    pub issues: Vec<Issue>,
}

impl SchemaResult {
    /// Typed success without issues.
    pub fn typed(output: Value) -> Self {
        Self {
            typed: true,
            output,
            issues: Vec::new(),
        }
    }

    /// Typed success carrying non-fatal issues.
    pub fn typed_with_issues(output: Value, issues: Vec<Issue>) -> Self {
        Self {
            typed: true,
            output,
            issues,
        }
    }

    /// Untyped failure. `issues` must not be empty.
    pub fn untyped(output: Value, issues: Vec<Issue>) -> Self {
        debug_assert!(!issues.is_empty(), "untyped result without issues");
        Self {
            typed: false,
            output,
            issues,
        }
    }

    /// Whether the result carries no issues.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// The output when valid, otherwise every issue as a [`ValidationError`].
    pub fn into_result(self) -> Result<Value, ValidationError> {
        if self.issues.is_empty() {
            Ok(self.output)
        } else {
            Err(ValidationError::new(self.issues))
        }
    }
}

/// Untyped result holding exactly one issue produced by a failed type check.
///
/// `issues` are the nested per-candidate issues of an alternation failure.
pub fn schema_issue(
    settings: &ParseSettings,
    schema: SchemaKind,
    message: &str,
    input: &Value,
    issues: Option<Vec<Issue>>,
) -> SchemaResult {
    let issue = Issue::new(settings, "type", schema, message, input.clone());
    let issue = match issues {
        Some(nested) => issue.with_issues(nested),
        None => issue,
    };
    SchemaResult::untyped(Value::Undefined, vec![issue])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Origin;

    #[test]
    fn test_schema_issue_shape() {
        let settings = ParseSettings::default();
        let result = schema_issue(&settings, SchemaKind::String, "Invalid type", &Value::from(1), None);
        assert!(!result.typed);
        assert!(result.output.is_undefined());
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.kind, "type");
        assert_eq!(issue.schema, SchemaKind::String);
        assert_eq!(issue.input, Value::from(1));
        assert!(issue.path.is_empty());
        assert_eq!(issue.origin, Origin::Value);
    }

    #[test]
    fn test_schema_issue_nested() {
        let settings = ParseSettings::default();
        let inner = schema_issue(&settings, SchemaKind::Literal, "a", &Value::Null, None).issues;
        let result = schema_issue(&settings, SchemaKind::Union, "b", &Value::Null, Some(inner));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].issues.len(), 1);
    }

    #[test]
    fn test_typed_with_issues_is_not_valid() {
        let settings = ParseSettings::default();
        let issues = schema_issue(&settings, SchemaKind::String, "x", &Value::Null, None).issues;
        let result = SchemaResult::typed_with_issues(Value::from("v"), issues);
        assert!(result.typed);
        assert!(!result.is_valid());
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_into_result_ok() {
        let result = SchemaResult::typed(Value::from(3));
        assert_eq!(result.into_result().unwrap(), Value::from(3));
    }
}
