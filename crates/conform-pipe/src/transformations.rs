//! # Stock Transformations
//!
//! Steps that always succeed and replace their input. String transforms
//! leave non-string values untouched.

use std::fmt;
use std::sync::Arc;

use conform_core::{ParseSettings, Value};

use crate::step::{Action, StepOutcome};

#[derive(Clone)]
enum Op {
    LowerCase,
    UpperCase,
    Trimmed,
    TrimmedStart,
    TrimmedEnd,
    Custom(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

/// A transforming step. Construct one with the functions in this module.
#[derive(Clone)]
pub struct Transformation(Op);

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            Op::LowerCase => "to_lower_case",
            Op::UpperCase => "to_upper_case",
            Op::Trimmed => "to_trimmed",
            Op::TrimmedStart => "to_trimmed_start",
            Op::TrimmedEnd => "to_trimmed_end",
            Op::Custom(_) => "to_custom",
        };
        f.debug_tuple("Transformation").field(&name).finish()
    }
}

impl Action for Transformation {
    fn run(&self, input: &Value, _settings: &ParseSettings) -> StepOutcome {
        let output = match (&self.0, input) {
            (Op::Custom(f), _) => f(input),
            (Op::LowerCase, Value::String(s)) => Value::String(s.to_lowercase()),
            (Op::UpperCase, Value::String(s)) => Value::String(s.to_uppercase()),
            (Op::Trimmed, Value::String(s)) => Value::from(s.trim()),
            (Op::TrimmedStart, Value::String(s)) => Value::from(s.trim_start()),
            (Op::TrimmedEnd, Value::String(s)) => Value::from(s.trim_end()),
            _ => return StepOutcome::Pass,
        };
        StepOutcome::Transformed(output)
    }
}

pub fn to_lower_case() -> Transformation {
    Transformation(Op::LowerCase)
}

pub fn to_upper_case() -> Transformation {
    Transformation(Op::UpperCase)
}

pub fn to_trimmed() -> Transformation {
    Transformation(Op::Trimmed)
}

pub fn to_trimmed_start() -> Transformation {
    Transformation(Op::TrimmedStart)
}

pub fn to_trimmed_end() -> Transformation {
    Transformation(Op::TrimmedEnd)
}

/// Replace the input with `f(input)`, whatever its kind.
pub fn to_custom<F>(f: F) -> Transformation
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Transformation(Op::Custom(Arc::new(f)))
}
