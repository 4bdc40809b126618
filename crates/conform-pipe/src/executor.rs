//! # Pipe Executor
//!
//! Runs a pipe over a value that already passed its schema's type check.
//!
//! - An empty pipe, or `skip_pipe`, returns the value unchanged.
//! - Steps run strictly in order; a failing step records an issue and does
//!   not transform the value, so the next step sees the last good value.
//! - `abort_pipe_early` (or `abort_early`) stops at the first failing step.
//! - The result is always typed: pipe issues are refinements on a
//!   structurally valid value. Callers decide validity by issue presence.
//!
//! The async executor has identical control flow. Steps are awaited one by
//! one, never concurrently, because each step consumes the previous output.

use conform_core::{Issue, ParseSettings, SchemaKind, SchemaResult, Value};

use crate::step::{AsyncStep, Step, StepOutcome};

/// Run `pipe` over `input`, appending any step issues to `issues`.
pub fn run_pipe(
    input: Value,
    pipe: &[Step],
    settings: &ParseSettings,
    schema: SchemaKind,
    mut issues: Vec<Issue>,
) -> SchemaResult {
    if pipe.is_empty() || settings.skip_pipe {
        return SchemaResult::typed_with_issues(input, issues);
    }

    let mut output = input;
    for step in pipe {
        let outcome = step.run(&output, settings);
        if apply(&mut output, outcome, settings, schema, &mut issues) {
            tracing::trace!(schema = %schema, "pipe aborted at first issue");
            break;
        }
    }
    SchemaResult::typed_with_issues(output, issues)
}

/// Async mirror of [`run_pipe`].
pub async fn run_pipe_async(
    input: Value,
    pipe: &[AsyncStep],
    settings: &ParseSettings,
    schema: SchemaKind,
    mut issues: Vec<Issue>,
) -> SchemaResult {
    if pipe.is_empty() || settings.skip_pipe {
        return SchemaResult::typed_with_issues(input, issues);
    }

    let mut output = input;
    for step in pipe {
        let outcome = step.run_async(&output, settings).await;
        if apply(&mut output, outcome, settings, schema, &mut issues) {
            tracing::trace!(schema = %schema, "async pipe aborted at first issue");
            break;
        }
    }
    SchemaResult::typed_with_issues(output, issues)
}

/// Fold one step outcome into the running state. Returns true when the
/// pipe must stop.
fn apply(
    output: &mut Value,
    outcome: StepOutcome,
    settings: &ParseSettings,
    schema: SchemaKind,
    issues: &mut Vec<Issue>,
) -> bool {
    match outcome {
        StepOutcome::Pass => false,
        StepOutcome::Transformed(value) => {
            *output = value;
            false
        }
        StepOutcome::Failed(failure) => {
            issues.push(Issue::new(
                settings,
                failure.kind,
                schema,
                failure.message,
                failure.input,
            ));
            settings.stops_pipe_early()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{check, lift, transform, transform_async};
    use crate::validations::{max_length, min_length};
    use std::sync::Arc;

    fn upper() -> Step {
        transform(|v| Value::from(v.as_str().unwrap_or_default().to_uppercase()))
    }

    #[test]
    fn test_empty_pipe_passes_through() {
        let result = run_pipe(Value::from("a"), &[], &ParseSettings::default(), SchemaKind::String, vec![]);
        assert!(result.typed);
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from("a"));
    }

    #[test]
    fn test_transform_applies_in_order() {
        let pipe: Vec<Step> = vec![upper(), Arc::new(min_length(2))];
        let result = run_pipe(Value::from("ab"), &pipe, &ParseSettings::default(), SchemaKind::String, vec![]);
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from("AB"));
    }

    #[test]
    fn test_collects_all_issues_by_default() {
        let pipe: Vec<Step> = vec![Arc::new(min_length(5)), Arc::new(max_length(1))];
        let result = run_pipe(Value::from("abc"), &pipe, &ParseSettings::default(), SchemaKind::String, vec![]);
        assert!(result.typed);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].kind, "min_length");
        assert_eq!(result.issues[1].kind, "max_length");
        assert_eq!(result.issues[0].schema, SchemaKind::String);
        assert!(result.issues[0].path.is_empty());
    }

    #[test]
    fn test_abort_pipe_early_stops_remaining_steps() {
        let pipe: Vec<Step> = vec![Arc::new(min_length(5)), Arc::new(max_length(1))];
        let settings = ParseSettings::default().with_abort_pipe_early(true);
        let result = run_pipe(Value::from("abc"), &pipe, &settings, SchemaKind::String, vec![]);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_failed_step_does_not_transform() {
        let pipe: Vec<Step> = vec![
            check("never", "fails", |_| false),
            check("seen", "sees original", |v| v == &Value::from("x")),
        ];
        let result = run_pipe(Value::from("x"), &pipe, &ParseSettings::default(), SchemaKind::String, vec![]);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "never");
    }

    #[test]
    fn test_skip_pipe() {
        let pipe: Vec<Step> = vec![Arc::new(min_length(5))];
        let settings = ParseSettings::default().with_skip_pipe(true);
        let result = run_pipe(Value::from("a"), &pipe, &settings, SchemaKind::String, vec![]);
        assert!(result.is_valid());
    }

    #[test]
    fn test_existing_issues_are_kept() {
        let prior = run_pipe(
            Value::from("a"),
            &[Arc::new(min_length(2)) as Step],
            &ParseSettings::default(),
            SchemaKind::String,
            vec![],
        )
        .issues;
        let result = run_pipe(Value::Null, &[], &ParseSettings::default(), SchemaKind::Object, prior);
        assert_eq!(result.issues.len(), 1);
        assert!(result.typed);
    }

    #[tokio::test]
    async fn test_async_pipe_sequential_transforms() {
        let pipe: Vec<AsyncStep> = vec![
            transform_async(|v: Value| async move {
                Value::from(format!("{}!", v.as_str().unwrap_or_default()))
            }),
            lift(upper()),
            lift(Arc::new(min_length(3))),
        ];
        let result =
            run_pipe_async(Value::from("hi"), &pipe, &ParseSettings::default(), SchemaKind::String, vec![])
                .await;
        assert!(result.is_valid());
        assert_eq!(result.output, Value::from("HI!"));
    }

    #[tokio::test]
    async fn test_async_pipe_abort_early() {
        let pipe: Vec<AsyncStep> = vec![lift(Arc::new(min_length(5))), lift(Arc::new(max_length(1)))];
        let settings = ParseSettings::default().with_abort_early(true);
        let result = run_pipe_async(Value::from("abc"), &pipe, &settings, SchemaKind::String, vec![]).await;
        assert_eq!(result.issues.len(), 1);
    }
}
