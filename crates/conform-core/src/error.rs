//! # Error Types
//!
//! Validation itself never fails with an error: every outcome is a
//! [`SchemaResult`](crate::SchemaResult). Errors exist at the two boundaries
//! around it:
//!
//! - [`ValidationError`] is raised by throw-on-invalid call sites such as the
//!   top-level `parse` method and carries the complete, pathed issue list.
//! - [`SchemaError`] reports a schema tree that was configured inconsistently
//!   at construction time.

use std::fmt;

use thiserror::Error;

use crate::issue::Issue;

/// Aggregate error carrying every issue of a failed parse.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed with {} issue(s):\n{}", .issues.len(), IssueList(.issues))]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn first(&self) -> Option<&Issue> {
        self.issues.first()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

struct IssueList<'a>(&'a [Issue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Error in schema construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A variant option object schema has no entry for the discriminator key.
    #[error("variant option {index} has no entry for discriminator key '{key}'")]
    MissingDiscriminator {
        /// Discriminator key name.
        key: String,
        /// Position of the offending option.
        index: usize,
    },

    /// A nested variant discriminates on a different key than its parent.
    #[error("nested variant discriminates on '{found}' but parent uses '{expected}'")]
    DiscriminatorMismatch {
        /// Key of the enclosing variant.
        expected: String,
        /// Key of the nested variant.
        found: String,
    },

    /// A combinator was given no options.
    #[error("{schema} schema requires at least one option")]
    NoOptions {
        /// Kind of the schema being built.
        schema: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kind::SchemaKind, settings::ParseSettings, value::Value, PathItem};

    #[test]
    fn test_validation_error_display_lists_paths() {
        let mut issue = Issue::new(
            &ParseSettings::default(),
            "type",
            SchemaKind::Number,
            "Invalid type",
            Value::from("x"),
        );
        issue.path.push_front(PathItem::object(&Value::Null, "age", &Value::from("x")));
        let err = ValidationError::new(vec![issue]);
        let text = err.to_string();
        assert!(text.starts_with("validation failed with 1 issue(s)"));
        assert!(text.contains("age: number (type): Invalid type"));
        assert_eq!(err.first().map(|i| i.schema), Some(SchemaKind::Number));
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::MissingDiscriminator {
            key: "type".into(),
            index: 2,
        };
        assert_eq!(
            err.to_string(),
            "variant option 2 has no entry for discriminator key 'type'"
        );
    }
}
