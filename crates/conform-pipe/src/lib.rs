//! # conform-pipe: Refinement and Transformation Pipes
//!
//! A pipe is an ordered list of steps bound to one schema. Steps run only
//! after the schema's own type check passed, each receiving the output of
//! the previous step.
//!
//! ## Step Contract (`step`)
//!
//! [`Action`] is the single extension point leaf validators implement: given
//! a value and the parse settings, a step either passes it through, returns a
//! transformed value, or reports a [`PipeIssue`]. [`AsyncAction`] is the
//! awaitable mirror; every sync action is usable where an async one is
//! expected.
//!
//! ## Executor (`executor`)
//!
//! [`run_pipe`] and [`run_pipe_async`] execute a pipe strictly in sequence,
//! turning step failures into [`Issue`](conform_core::Issue)s tagged with
//! the owning schema's kind. Pipe issues never receive a path item of their
//! own: they are reported at the owning schema's depth.
//!
//! ## Stock Steps
//!
//! - [`validations`]: length, value, size, byte-length and format checks.
//! - [`transformations`]: string case and trimming transforms.

pub mod executor;
pub mod step;
pub mod transformations;
pub mod validations;

pub use executor::{run_pipe, run_pipe_async};
pub use step::{
    check, check_async, lift, transform, transform_async, Action, AsyncAction, AsyncStep, Pipe,
    PipeAsync, PipeIssue, Step, StepOutcome,
};
pub use transformations::Transformation;
pub use validations::Validation;
