//! # Child Result Aggregation
//!
//! Structural and combinator schemas fold one child result at a time into
//! an [`Aggregate`]. The fold owns three rules:
//!
//! - every child issue gets exactly one path item for the child's position
//!   prepended before it joins the container's issue list;
//! - any untyped child makes the whole container untyped;
//! - under `abort_early` the first child issue ends the fold and marks the
//!   container untyped.
//!
//! Sync loops and async completion loops call the same fold, so both modes
//! agree on typedness and output assignment.

use conform_core::{
    prepend_path, Issue, ParseSettings, PathItem, SchemaKind, SchemaResult, Value,
};
use conform_pipe::{run_pipe, run_pipe_async, AsyncStep, Step};

/// What the container should do after folding one child.
#[derive(Debug)]
pub(crate) enum Flow {
    /// Keep going; the child's output is offered for assignment.
    Continue { output: Value, typed: bool },
    /// Stop visiting positions.
    Abort,
}

#[derive(Debug)]
pub(crate) struct Aggregate {
    typed: bool,
    issues: Vec<Issue>,
}

impl Aggregate {
    pub(crate) fn new() -> Self {
        Self {
            typed: true,
            issues: Vec::new(),
        }
    }

    /// Fold a child result produced at the position described by `item`.
    pub(crate) fn absorb(
        &mut self,
        result: SchemaResult,
        item: impl FnOnce() -> PathItem,
        settings: &ParseSettings,
    ) -> Flow {
        let item = result.has_issues().then(item);
        self.fold(result, item.as_ref(), settings)
    }

    /// Fold the result of an option that validated the container's own input,
    /// so no path item applies.
    pub(crate) fn absorb_unpathed(&mut self, result: SchemaResult, settings: &ParseSettings) -> Flow {
        self.fold(result, None, settings)
    }

    /// Fold a key and value result sharing one path item. The value is only
    /// produced when folding the key did not abort.
    pub(crate) fn absorb_pair(
        &mut self,
        key: SchemaResult,
        value: impl FnOnce() -> SchemaResult,
        item: impl Fn() -> PathItem,
        settings: &ParseSettings,
    ) -> PairFlow {
        let key_item = key.has_issues().then(&item);
        let key_clean = key_item.is_none();
        let key = match self.fold(key, key_item.as_ref(), settings) {
            Flow::Continue { output, .. } => output,
            Flow::Abort => return PairFlow::Abort,
        };
        let value = value();
        // Both halves of one entry share the same path item.
        let value_item = value.has_issues().then(|| key_item.unwrap_or_else(&item));
        let value_clean = value_item.is_none();
        match self.fold(value, value_item.as_ref(), settings) {
            Flow::Continue { output, .. } => PairFlow::Continue {
                key,
                value: output,
                clean: key_clean && value_clean,
            },
            Flow::Abort => PairFlow::Abort,
        }
    }

    fn fold(&mut self, result: SchemaResult, item: Option<&PathItem>, settings: &ParseSettings) -> Flow {
        let SchemaResult {
            typed,
            output,
            mut issues,
        } = result;
        if !issues.is_empty() {
            if let Some(item) = item {
                prepend_path(&mut issues, item);
            }
            self.issues.append(&mut issues);
            if settings.abort_early {
                self.typed = false;
                return Flow::Abort;
            }
        }
        if !typed {
            self.typed = false;
        }
        Flow::Continue { output, typed }
    }

    /// Record an issue that belongs to the container itself.
    pub(crate) fn push(&mut self, issues: Vec<Issue>, typed: bool) {
        self.issues.extend(issues);
        if !typed {
            self.typed = false;
        }
    }

    pub(crate) fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub(crate) fn is_typed(&self) -> bool {
        self.typed
    }

    /// Close the fold: run the container's pipe if every child was typed.
    pub(crate) fn finish(
        self,
        output: Value,
        pipe: &[Step],
        settings: &ParseSettings,
        schema: SchemaKind,
    ) -> SchemaResult {
        if self.typed {
            run_pipe(output, pipe, settings, schema, self.issues)
        } else {
            SchemaResult::untyped(output, self.issues)
        }
    }

    /// Async mirror of [`Aggregate::finish`].
    pub(crate) async fn finish_async(
        self,
        output: Value,
        pipe: &[AsyncStep],
        settings: &ParseSettings,
        schema: SchemaKind,
    ) -> SchemaResult {
        if self.typed {
            run_pipe_async(output, pipe, settings, schema, self.issues).await
        } else {
            SchemaResult::untyped(output, self.issues)
        }
    }

    /// Close the fold without a pipe.
    pub(crate) fn into_result(self, output: Value) -> SchemaResult {
        if self.typed {
            SchemaResult::typed_with_issues(output, self.issues)
        } else {
            SchemaResult::untyped(output, self.issues)
        }
    }
}

/// Outcome of [`Aggregate::absorb_pair`].
#[derive(Debug)]
pub(crate) enum PairFlow {
    /// `clean` is set when neither the key nor the value reported an issue.
    Continue { key: Value, value: Value, clean: bool },
    Abort,
}
