//! # Stock Validations
//!
//! Refinement steps that never change their input. Every validation has a
//! snake_case issue kind (`"min_length"`, `"iso_week"`, ...) and a default
//! message that [`Validation::message`] overrides.
//!
//! ## Applicability
//!
//! - Length checks read strings (in characters) and arrays.
//! - Value checks order numbers, big integers, strings and valid dates
//!   against a requirement of the same kind.
//! - Size checks read maps, sets and blobs.
//! - Byte checks and format checks read strings.
//!
//! An input a rule cannot read is rejected with that rule's issue. A NaN
//! compares as neither smaller nor larger, so value bounds reject it.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use conform_core::{ParseSettings, Value};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::step::{Action, StepOutcome};

// ─── Format patterns ────────────────────────────────────────────────

// Constant patterns; the unit tests force each one.

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\w+-]+(?:\.[\w+-]+)*@[\da-z]+(?:[.-][\da-z]+)*\.[a-z]{2,}$")
        .expect("email pattern compiles")
});

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\p{Extended_Pictographic}|\p{Emoji_Component})+$").expect("emoji pattern compiles")
});

static IMEI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}[ |/|-]?\d{6}[ |/|-]?\d{6}[ |/|-]?\d$").expect("imei pattern compiles")
});

static ISO_WEEK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-W(?:0[1-9]|[1-4]\d|5[0-3])$").expect("iso week pattern compiles")
});

static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-(?:0[1-9]|1[0-2])-(?:[12]\d|0[1-9]|3[01])T(?:0\d|1\d|2[0-3])(?::[0-5]\d){2}\.\d{3}Z$",
    )
    .expect("iso timestamp pattern compiles")
});

/// Luhn checksum over the decimal digits of `input`.
fn luhn(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

// ─── Measurements ───────────────────────────────────────────────────

fn length_of(input: &Value) -> Option<usize> {
    match input {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn size_of(input: &Value) -> Option<usize> {
    match input {
        Value::Map(entries) => Some(entries.len()),
        Value::Set(items) => Some(items.len()),
        Value::Blob(bytes) => Some(bytes.len()),
        _ => None,
    }
}

fn byte_length_of(input: &Value) -> Option<usize> {
    input.as_str().map(str::len)
}

fn compare(input: &Value, requirement: &Value) -> Option<Ordering> {
    match (input, requirement) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Date(Some(a)), Value::Date(Some(b))) => Some(a.cmp(b)),
        _ => None,
    }
}

// ─── Validation ─────────────────────────────────────────────────────

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
enum Rule {
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    MinValue(Value),
    MaxValue(Value),
    Value(Value),
    Integer,
    Finite,
    Regex(Regex),
    StartsWith(String),
    EndsWith(String),
    Bytes(usize),
    MinBytes(usize),
    MaxBytes(usize),
    MinSize(usize),
    MaxSize(usize),
    Email,
    Emoji,
    Imei,
    IsoWeek,
    IsoTimestamp,
    Custom(Predicate),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) => write!(f, "MinLength({n})"),
            Self::MaxLength(n) => write!(f, "MaxLength({n})"),
            Self::Length(n) => write!(f, "Length({n})"),
            Self::MinValue(v) => write!(f, "MinValue({v:?})"),
            Self::MaxValue(v) => write!(f, "MaxValue({v:?})"),
            Self::Value(v) => write!(f, "Value({v:?})"),
            Self::Integer => f.write_str("Integer"),
            Self::Finite => f.write_str("Finite"),
            Self::Regex(re) => write!(f, "Regex({})", re.as_str()),
            Self::StartsWith(s) => write!(f, "StartsWith({s:?})"),
            Self::EndsWith(s) => write!(f, "EndsWith({s:?})"),
            Self::Bytes(n) => write!(f, "Bytes({n})"),
            Self::MinBytes(n) => write!(f, "MinBytes({n})"),
            Self::MaxBytes(n) => write!(f, "MaxBytes({n})"),
            Self::MinSize(n) => write!(f, "MinSize({n})"),
            Self::MaxSize(n) => write!(f, "MaxSize({n})"),
            Self::Email => f.write_str("Email"),
            Self::Emoji => f.write_str("Emoji"),
            Self::Imei => f.write_str("Imei"),
            Self::IsoWeek => f.write_str("IsoWeek"),
            Self::IsoTimestamp => f.write_str("IsoTimestamp"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Rule {
    fn accepts(&self, input: &Value) -> bool {
        match self {
            Self::MinLength(n) => length_of(input).is_some_and(|len| len >= *n),
            Self::MaxLength(n) => length_of(input).is_some_and(|len| len <= *n),
            Self::Length(n) => length_of(input) == Some(*n),
            Self::MinValue(req) => {
                matches!(compare(input, req), Some(Ordering::Greater | Ordering::Equal))
            }
            Self::MaxValue(req) => {
                matches!(compare(input, req), Some(Ordering::Less | Ordering::Equal))
            }
            Self::Value(req) => input.strict_eq(req),
            Self::Integer => input.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0),
            Self::Finite => input.as_f64().is_some_and(f64::is_finite),
            Self::Regex(re) => input.as_str().is_some_and(|s| re.is_match(s)),
            Self::StartsWith(prefix) => input.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => input.as_str().is_some_and(|s| s.ends_with(suffix.as_str())),
            Self::Bytes(n) => byte_length_of(input) == Some(*n),
            Self::MinBytes(n) => byte_length_of(input).is_some_and(|len| len >= *n),
            Self::MaxBytes(n) => byte_length_of(input).is_some_and(|len| len <= *n),
            Self::MinSize(n) => size_of(input).is_some_and(|size| size >= *n),
            Self::MaxSize(n) => size_of(input).is_some_and(|size| size <= *n),
            Self::Email => input.as_str().is_some_and(|s| EMAIL.is_match(s)),
            Self::Emoji => input.as_str().is_some_and(|s| EMOJI.is_match(s)),
            Self::Imei => input
                .as_str()
                .is_some_and(|s| IMEI.is_match(s) && luhn(s)),
            Self::IsoWeek => input.as_str().is_some_and(|s| ISO_WEEK.is_match(s)),
            Self::IsoTimestamp => input
                .as_str()
                .is_some_and(|s| ISO_TIMESTAMP.is_match(s)),
            Self::Custom(predicate) => predicate(input),
        }
    }
}

/// A refinement step. Construct one with the functions in this module.
#[derive(Debug, Clone)]
pub struct Validation {
    kind: &'static str,
    message: String,
    rule: Rule,
}

impl Validation {
    fn new(kind: &'static str, message: &str, rule: Rule) -> Self {
        Self {
            kind,
            message: message.to_string(),
            rule,
        }
    }

    /// Replace the default issue message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Issue kind reported on failure.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Action for Validation {
    fn run(&self, input: &Value, _settings: &ParseSettings) -> StepOutcome {
        if self.rule.accepts(input) {
            StepOutcome::Pass
        } else {
            StepOutcome::fail(self.kind, self.message.clone(), input)
        }
    }
}

// ─── Constructors ───────────────────────────────────────────────────

pub fn min_length(requirement: usize) -> Validation {
    Validation::new("min_length", "Invalid length", Rule::MinLength(requirement))
}

pub fn max_length(requirement: usize) -> Validation {
    Validation::new("max_length", "Invalid length", Rule::MaxLength(requirement))
}

pub fn length(requirement: usize) -> Validation {
    Validation::new("length", "Invalid length", Rule::Length(requirement))
}

pub fn min_value(requirement: impl Into<Value>) -> Validation {
    Validation::new("min_value", "Invalid value", Rule::MinValue(requirement.into()))
}

pub fn max_value(requirement: impl Into<Value>) -> Validation {
    Validation::new("max_value", "Invalid value", Rule::MaxValue(requirement.into()))
}

/// Input must be strictly equal to `requirement`.
pub fn value(requirement: impl Into<Value>) -> Validation {
    Validation::new("value", "Invalid value", Rule::Value(requirement.into()))
}

pub fn integer() -> Validation {
    Validation::new("integer", "Invalid integer", Rule::Integer)
}

pub fn finite() -> Validation {
    Validation::new("finite", "Invalid finite number", Rule::Finite)
}

pub fn regex(pattern: Regex) -> Validation {
    Validation::new("regex", "Invalid regex", Rule::Regex(pattern))
}

pub fn starts_with(prefix: impl Into<String>) -> Validation {
    Validation::new("starts_with", "Invalid start", Rule::StartsWith(prefix.into()))
}

pub fn ends_with(suffix: impl Into<String>) -> Validation {
    Validation::new("ends_with", "Invalid end", Rule::EndsWith(suffix.into()))
}

/// Exact UTF-8 byte length.
pub fn bytes(requirement: usize) -> Validation {
    Validation::new("bytes", "Invalid byte length", Rule::Bytes(requirement))
}

pub fn min_bytes(requirement: usize) -> Validation {
    Validation::new("min_bytes", "Invalid byte length", Rule::MinBytes(requirement))
}

pub fn max_bytes(requirement: usize) -> Validation {
    Validation::new("max_bytes", "Invalid byte length", Rule::MaxBytes(requirement))
}

pub fn min_size(requirement: usize) -> Validation {
    Validation::new("min_size", "Invalid size", Rule::MinSize(requirement))
}

pub fn max_size(requirement: usize) -> Validation {
    Validation::new("max_size", "Invalid size", Rule::MaxSize(requirement))
}

pub fn email() -> Validation {
    Validation::new("email", "Invalid email", Rule::Email)
}

pub fn emoji() -> Validation {
    Validation::new("emoji", "Invalid emoji", Rule::Emoji)
}

/// IMEI format with a valid Luhn check digit. Separators may be spaces,
/// slashes or dashes.
pub fn imei() -> Validation {
    Validation::new("imei", "Invalid IMEI", Rule::Imei)
}

/// `YYYY-Www` with weeks 01 to 53.
pub fn iso_week() -> Validation {
    Validation::new("iso_week", "Invalid week", Rule::IsoWeek)
}

/// `YYYY-MM-DDThh:mm:ss.sssZ`.
pub fn iso_timestamp() -> Validation {
    Validation::new("iso_timestamp", "Invalid timestamp", Rule::IsoTimestamp)
}

pub fn custom<F>(predicate: F) -> Validation
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Validation::new("custom", "Invalid input", Rule::Custom(Arc::new(predicate)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passes(validation: &Validation, input: impl Into<Value>) -> bool {
        validation.run(&input.into(), &ParseSettings::default()) == StepOutcome::Pass
    }

    #[test]
    fn test_format_patterns_compile() {
        for pattern in [&EMAIL, &EMOJI, &IMEI, &ISO_WEEK, &ISO_TIMESTAMP] {
            assert!(!Lazy::force(pattern).as_str().is_empty());
        }
    }

    #[test]
    fn test_length_counts_chars_and_items() {
        assert!(passes(&min_length(3), "äöü"));
        assert!(!passes(&min_length(4), "äöü"));
        assert!(passes(&max_length(2), Value::Array(vec![Value::Null, Value::Null])));
        assert!(passes(&length(2), "ab"));
        assert!(!passes(&length(2), "abc"));
        assert!(!passes(&min_length(0), 5));
    }

    #[test]
    fn test_value_bounds() {
        assert!(passes(&min_value(3), 3));
        assert!(!passes(&min_value(3), 2.5));
        assert!(passes(&max_value("m"), "a"));
        assert!(!passes(&max_value(10), f64::NAN));
        assert!(!passes(&min_value(1), "1"));
        assert!(!passes(&min_value(1), Value::Date(None)));
        assert!(passes(&min_value(Value::BigInt(5)), Value::BigInt(9)));
    }

    #[test]
    fn test_value_strict_equality() {
        assert!(passes(&value("a"), "a"));
        assert!(!passes(&value(1), "1"));
        assert!(!passes(&value(f64::NAN), f64::NAN));
    }

    #[test]
    fn test_integer_and_finite() {
        assert!(passes(&integer(), 4));
        assert!(!passes(&integer(), 4.5));
        assert!(!passes(&integer(), f64::INFINITY));
        assert!(passes(&finite(), -1.5));
        assert!(!passes(&finite(), f64::NAN));
    }

    #[test]
    fn test_string_prefix_suffix_regex() {
        assert!(passes(&starts_with("ab"), "abc"));
        assert!(!passes(&ends_with("ab"), "abc"));
        let hex = regex(Regex::new("^[0-9a-f]+$").unwrap());
        assert!(passes(&hex, "deadbeef"));
        assert!(!passes(&hex, "xyz"));
    }

    #[test]
    fn test_bytes_counts_utf8() {
        assert!(passes(&bytes(2), "ä"));
        assert!(!passes(&max_bytes(1), "ä"));
        assert!(passes(&min_bytes(1), "a"));
    }

    #[test]
    fn test_size() {
        let set = Value::Set(vec![Value::from(1), Value::from(2)]);
        assert!(passes(&min_size(2), set.clone()));
        assert!(!passes(&max_size(1), set));
        assert!(passes(&max_size(3), Value::Blob(vec![0, 1, 2])));
        assert!(!passes(&min_size(0), "abc"));
    }

    #[test]
    fn test_formats() {
        assert!(passes(&email(), "jane.doe+x@example.com"));
        assert!(!passes(&email(), "jane@localhost"));
        assert!(passes(&imei(), "49-015420-323751-8"));
        assert!(!passes(&imei(), "49-015420-323751-9"));
        assert!(passes(&iso_week(), "2024-W07"));
        assert!(!passes(&iso_week(), "2024-W54"));
        assert!(passes(&iso_timestamp(), "2024-01-31T23:59:59.999Z"));
        assert!(!passes(&iso_timestamp(), "2024-01-31T24:00:00.000Z"));
        assert!(passes(&emoji(), "😀"));
        assert!(!passes(&emoji(), "a"));
    }

    #[test]
    fn test_custom_and_message_override() {
        let even = custom(|v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0)).message("Must be even");
        assert!(passes(&even, 2));
        match even.run(&Value::from(3), &ParseSettings::default()) {
            StepOutcome::Failed(issue) => {
                assert_eq!(issue.kind, "custom");
                assert_eq!(issue.message, "Must be even");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_default_messages() {
        match min_length(2).run(&Value::from("a"), &ParseSettings::default()) {
            StepOutcome::Failed(issue) => {
                assert_eq!(issue.kind, "min_length");
                assert_eq!(issue.message, "Invalid length");
                assert_eq!(issue.input, Value::from("a"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_luhn() {
        assert!(luhn("79927398713"));
        assert!(!luhn("79927398710"));
        assert!(!luhn(""));
    }
}
