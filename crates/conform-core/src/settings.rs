//! # Parse Settings
//!
//! Per-call configuration passed down the schema tree. Settings are created
//! once per parse invocation (or per key/value dispatch inside map and record
//! schemas) and never mutated in place.
//!
//! `ParseSettings` is serde-deserializable so an embedding application can load
//! it from any configuration source:
//!
//! ```
//! use conform_core::ParseSettings;
//!
//! let settings: ParseSettings = serde_json::from_str(r#"{"abortEarly": true}"#).unwrap();
//! assert!(settings.abort_early);
//! assert!(!settings.skip_pipe);
//! ```

use serde::{Deserialize, Serialize};

/// Whether the value currently being validated is a map/record key or a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Key,
    #[default]
    Value,
}

/// Transient configuration for a single parse call.
///
/// Absence of a field means "do not abort early, do not skip the pipe,
/// value origin".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseSettings {
    /// Stop structural and combinator schemas at the first issue.
    pub abort_early: bool,
    /// Stop a pipe at its first failing step.
    pub abort_pipe_early: bool,
    /// Bypass every refinement pipe.
    pub skip_pipe: bool,
    /// Key/value annotation copied into issues.
    pub origin: Origin,
}

impl ParseSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.abort_early = abort_early;
        self
    }

    pub fn with_abort_pipe_early(mut self, abort_pipe_early: bool) -> Self {
        self.abort_pipe_early = abort_pipe_early;
        self
    }

    pub fn with_skip_pipe(mut self, skip_pipe: bool) -> Self {
        self.skip_pipe = skip_pipe;
        self
    }

    /// Copy of these settings for validating a map or record key.
    pub fn for_key(&self) -> Self {
        Self {
            origin: Origin::Key,
            ..*self
        }
    }

    /// Copy of these settings for validating a map or record value.
    pub fn for_value(&self) -> Self {
        Self {
            origin: Origin::Value,
            ..*self
        }
    }

    /// Whether a pipe must stop after its first failing step.
    pub fn stops_pipe_early(&self) -> bool {
        self.abort_early || self.abort_pipe_early
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ParseSettings::default();
        assert!(!settings.abort_early);
        assert!(!settings.abort_pipe_early);
        assert!(!settings.skip_pipe);
        assert_eq!(settings.origin, Origin::Value);
    }

    #[test]
    fn test_for_key_keeps_flags() {
        let settings = ParseSettings::new().with_abort_early(true).with_skip_pipe(true);
        let key = settings.for_key();
        assert_eq!(key.origin, Origin::Key);
        assert!(key.abort_early);
        assert!(key.skip_pipe);
        assert_eq!(key.for_value(), settings);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let settings: ParseSettings =
            serde_json::from_str(r#"{"abortPipeEarly": true, "origin": "key"}"#).unwrap();
        assert!(settings.abort_pipe_early);
        assert_eq!(settings.origin, Origin::Key);
        assert!(settings.stops_pipe_early());
    }

    #[test]
    fn test_serialize_round_trip_shape() {
        let json = serde_json::to_value(ParseSettings::new().with_abort_early(true)).unwrap();
        assert_eq!(json["abortEarly"], serde_json::Value::Bool(true));
        assert_eq!(json["origin"], serde_json::Value::String("value".into()));
    }
}
