//! # Pipe Step Contract
//!
//! Steps are opaque to the schemas that run them. They must be pure with
//! respect to the pipe (no state shared across calls) but may perform
//! arbitrary computation.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use conform_core::{ParseSettings, Value};
use futures_util::future::{self, BoxFuture, FutureExt};

/// Failure reported by a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeIssue {
    /// Step-specific kind such as `"min_length"`.
    pub kind: Cow<'static, str>,
    pub message: String,
    /// The value the step rejected.
    pub input: Value,
}

/// What a step did with its input.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Input accepted unchanged.
    Pass,
    /// Input accepted and replaced.
    Transformed(Value),
    /// Input rejected; the value is not transformed.
    Failed(PipeIssue),
}

impl StepOutcome {
    pub fn fail(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        input: &Value,
    ) -> Self {
        Self::Failed(PipeIssue {
            kind: kind.into(),
            message: message.into(),
            input: input.clone(),
        })
    }
}

/// A synchronous pipe step.
pub trait Action: fmt::Debug + Send + Sync {
    fn run(&self, input: &Value, settings: &ParseSettings) -> StepOutcome;
}

/// An awaitable pipe step.
pub trait AsyncAction: fmt::Debug + Send + Sync {
    fn run_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, StepOutcome>;
}

impl<A: Action + ?Sized> AsyncAction for A {
    fn run_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, StepOutcome> {
        future::ready(self.run(input, settings)).boxed()
    }
}

impl<A: Action + ?Sized> Action for Arc<A> {
    fn run(&self, input: &Value, settings: &ParseSettings) -> StepOutcome {
        (**self).run(input, settings)
    }
}

impl AsyncAction for Arc<dyn AsyncAction> {
    fn run_async<'a>(
        &'a self,
        input: &'a Value,
        settings: &'a ParseSettings,
    ) -> BoxFuture<'a, StepOutcome> {
        (**self).run_async(input, settings)
    }
}

pub type Step = Arc<dyn Action>;
pub type Pipe = Vec<Step>;
pub type AsyncStep = Arc<dyn AsyncAction>;
pub type PipeAsync = Vec<AsyncStep>;

/// Use a sync step inside an async pipe.
pub fn lift(step: Step) -> AsyncStep {
    Arc::new(step)
}

// ─── Closure-backed steps ───────────────────────────────────────────

/// Predicate step built by [`check`].
pub struct Check<F> {
    kind: Cow<'static, str>,
    message: String,
    predicate: F,
}

impl<F> fmt::Debug for Check<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl<F> Action for Check<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn run(&self, input: &Value, _settings: &ParseSettings) -> StepOutcome {
        if (self.predicate)(input) {
            StepOutcome::Pass
        } else {
            StepOutcome::fail(self.kind.clone(), self.message.clone(), input)
        }
    }
}

/// Step failing with `kind`/`message` whenever `predicate` returns false.
pub fn check<F>(kind: impl Into<Cow<'static, str>>, message: impl Into<String>, predicate: F) -> Step
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(Check {
        kind: kind.into(),
        message: message.into(),
        predicate,
    })
}

/// Mapping step built by [`transform`].
pub struct Transform<F>(F);

impl<F> fmt::Debug for Transform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform")
    }
}

impl<F> Action for Transform<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn run(&self, input: &Value, _settings: &ParseSettings) -> StepOutcome {
        StepOutcome::Transformed((self.0)(input))
    }
}

/// Step replacing its input with `f(input)`.
pub fn transform<F>(f: F) -> Step
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Arc::new(Transform(f))
}

/// Awaitable predicate step built by [`check_async`].
pub struct CheckAsync<F> {
    kind: Cow<'static, str>,
    message: String,
    predicate: F,
}

impl<F> fmt::Debug for CheckAsync<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckAsync").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl<F, Fut> AsyncAction for CheckAsync<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn run_async<'a>(
        &'a self,
        input: &'a Value,
        _settings: &'a ParseSettings,
    ) -> BoxFuture<'a, StepOutcome> {
        let pending = (self.predicate)(input.clone());
        async move {
            if pending.await {
                StepOutcome::Pass
            } else {
                StepOutcome::fail(self.kind.clone(), self.message.clone(), input)
            }
        }
        .boxed()
    }
}

/// Async step failing with `kind`/`message` whenever `predicate` resolves false.
pub fn check_async<F, Fut>(
    kind: impl Into<Cow<'static, str>>,
    message: impl Into<String>,
    predicate: F,
) -> AsyncStep
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(CheckAsync {
        kind: kind.into(),
        message: message.into(),
        predicate,
    })
}

/// Awaitable mapping step built by [`transform_async`].
pub struct TransformAsync<F>(F);

impl<F> fmt::Debug for TransformAsync<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformAsync")
    }
}

impl<F, Fut> AsyncAction for TransformAsync<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Value> + Send + 'static,
{
    fn run_async<'a>(
        &'a self,
        input: &'a Value,
        _settings: &'a ParseSettings,
    ) -> BoxFuture<'a, StepOutcome> {
        (self.0)(input.clone()).map(StepOutcome::Transformed).boxed()
    }
}

/// Async step replacing its input with the resolved `f(input)`.
pub fn transform_async<F, Fut>(f: F) -> AsyncStep
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    Arc::new(TransformAsync(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pass_and_fail() {
        let step = check("positive", "Must be positive", |v| v.as_f64().is_some_and(|n| n > 0.0));
        let settings = ParseSettings::default();
        assert_eq!(step.run(&Value::from(1), &settings), StepOutcome::Pass);
        match step.run(&Value::from(-1), &settings) {
            StepOutcome::Failed(issue) => {
                assert_eq!(issue.kind, "positive");
                assert_eq!(issue.input, Value::from(-1));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_transform() {
        let step = transform(|v| Value::from(v.to_string()));
        assert_eq!(
            step.run(&Value::from(2), &ParseSettings::default()),
            StepOutcome::Transformed(Value::from("2"))
        );
    }

    #[tokio::test]
    async fn test_lifted_step_runs_async() {
        let step = lift(check("never", "no", |_| false));
        let outcome = step.run_async(&Value::Null, &ParseSettings::default()).await;
        assert!(matches!(outcome, StepOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_check_async() {
        let step = check_async("even", "Must be even", |v: Value| async move {
            v.as_f64().is_some_and(|n| n % 2.0 == 0.0)
        });
        let settings = ParseSettings::default();
        assert_eq!(step.run_async(&Value::from(4), &settings).await, StepOutcome::Pass);
        assert!(matches!(
            step.run_async(&Value::from(3), &settings).await,
            StepOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_transform_async() {
        let step = transform_async(|v: Value| async move {
            Value::from(v.as_f64().unwrap_or_default() * 10.0)
        });
        assert_eq!(
            step.run_async(&Value::from(2), &ParseSettings::default()).await,
            StepOutcome::Transformed(Value::from(20))
        );
    }
}
