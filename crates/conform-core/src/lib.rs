//! # conform-core: Foundational Types for the Conform Engine
//!
//! This crate is the leaf of the conform workspace. It defines the shared
//! vocabulary every schema, pipe step and top-level method speaks: the
//! untyped [`Value`] being validated, the [`Issue`] and [`PathItem`] records
//! that describe what is wrong and where, the [`SchemaResult`] every parse
//! returns, and the per-call [`ParseSettings`].
//!
//! ## Key Design Principles
//!
//! 1. **`typed` is a first-class field.** A [`SchemaResult`] records whether
//!    every contributing value passed its structural type check separately
//!    from whether issues exist. Structural schemas need both: pipe issues can
//!    coexist with a typed output, and an abort-early container is untyped
//!    while still carrying the deepest issue found so far.
//!
//! 2. **Paths are built bottom-up.** An [`Issue`] is created at the failure
//!    site with an empty [`Path`]; each structural ancestor prepends exactly
//!    one [`PathItem`] while the issue propagates upward.
//!
//! 3. **One error type per failure class.** [`ValidationError`] carries a
//!    complete issue list to throw-on-invalid call sites; [`SchemaError`]
//!    reports schemas that were configured inconsistently.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `conform-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod issue;
pub mod kind;
pub mod merge;
pub mod result;
pub mod settings;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{SchemaError, ValidationError};
pub use issue::{prepend_path, Issue, Path, PathItem, PathKey, PathKind};
pub use kind::SchemaKind;
pub use merge::merge_outputs;
pub use result::{schema_issue, SchemaResult};
pub use settings::{Origin, ParseSettings};
pub use value::{Instance, Object, Symbol, Value};
