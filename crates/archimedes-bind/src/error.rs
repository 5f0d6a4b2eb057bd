//! Binding error types.
//!
//! A binding call fails with exactly one [`BindError`]. Failures that can be
//! attributed to individual fields arrive as [`BindError::Fields`]; every other
//! variant is passed through as the underlying reader or decoder reported it.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::decode::{ConstructionError, DecodeError};

/// The request data source a binding call read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindSource {
    /// Matched path parameters.
    Path,
    /// URL query string.
    Query,
    /// Url-encoded or multipart form body.
    Form,
    /// JSON request body.
    Json,
    /// A value map supplied by the caller.
    Map,
    /// All request sources merged by precedence.
    Merged,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Form => write!(f, "form"),
            Self::Json => write!(f, "json"),
            Self::Map => write!(f, "map"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Field-level decode failures, keyed by the external field key.
///
/// Entries keep the order in which the decoder reported them. Messages come
/// from a small fixed vocabulary: `"unexpected"`, `"<type> type expected"`
/// and `"invalid type"`.
///
/// Serializes as a flat JSON object so handlers can embed it in their error
/// envelopes:
///
/// ```rust
/// use archimedes_bind::{Bind, Binder, ValueMap};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize, Bind)]
/// struct Person {
///     age: i64,
/// }
///
/// let mut map = ValueMap::new();
/// map.insert("age".into(), json!("x"));
/// map.insert("nickname".into(), json!("al"));
///
/// let err = Binder::new().bind_map::<Person>(map, None).unwrap_err();
/// let errors = err.field_errors().unwrap();
///
/// assert_eq!(
///     serde_json::to_value(errors).unwrap(),
///     json!({"age": "int type expected", "nickname": "unexpected"})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    entries: IndexMap<String, String>,
}

impl FieldErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a message for `key`. The first message for a key is kept.
    pub(crate) fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_insert_with(|| message.into());
    }

    /// Returns the message recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, message)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid fields: ")?;
        for (i, (key, message)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Error returned by every binding entry point.
#[derive(Error, Debug)]
pub enum BindError {
    /// Decode failures attributed to specific fields.
    #[error("{0}")]
    Fields(FieldErrors),

    /// A body-based collector ran after the body was already taken.
    #[error("request body has already been consumed")]
    BodyConsumed,

    /// The request body exceeds the configured limit.
    #[error("payload too large: max {limit} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured maximum in bytes.
        limit: usize,
        /// Actual body length in bytes.
        actual: usize,
    },

    /// A source could not be read or parsed into values.
    #[error("failed to read {origin} values: {message}")]
    Read {
        /// The source being read.
        origin: BindSource,
        /// What went wrong.
        message: String,
    },

    /// The JSON body is not syntactically valid.
    #[error("malformed JSON body: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// A decoder failure that did not match any recognized field shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The generic decoder could not be constructed for the target.
    #[error("failed to construct decoder: {0}")]
    Construction(#[from] ConstructionError),
}

impl BindError {
    /// Creates a read failure for `origin`.
    #[must_use]
    pub fn read(origin: BindSource, message: impl Into<String>) -> Self {
        Self::Read {
            origin,
            message: message.into(),
        }
    }

    /// Returns the field errors if this failure was attributed to fields.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Fields(errors) => Some(errors),
            _ => None,
        }
    }

    /// Converts into the field errors, handing back any other failure.
    pub fn into_field_errors(self) -> Result<FieldErrors, Self> {
        match self {
            Self::Fields(errors) => Ok(errors),
            other => Err(other),
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fields(_) => "INVALID_FIELDS",
            Self::BodyConsumed => "BODY_CONSUMED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Read { .. } => "READ_FAILED",
            Self::MalformedJson(_) => "MALFORMED_JSON",
            Self::Decode(_) => "DECODE_FAILED",
            Self::Construction(_) => "DECODER_CONSTRUCTION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_first_message_and_order() {
        let mut errors = FieldErrors::new();
        errors.insert("age", "int type expected");
        errors.insert("x", "unexpected");
        errors.insert("age", "invalid type");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("age"), Some("int type expected"));
        let keys: Vec<_> = errors.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["age", "x"]);
    }

    #[test]
    fn test_field_errors_serialize_as_object() {
        let mut errors = FieldErrors::new();
        errors.insert("name", "string type expected");
        errors.insert("extra", "unexpected");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            json,
            r#"{"name":"string type expected","extra":"unexpected"}"#
        );
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.insert("a", "unexpected");
        errors.insert("b", "bool type expected");

        assert_eq!(
            errors.to_string(),
            "invalid fields: a: unexpected, b: bool type expected"
        );
    }

    #[test]
    fn test_into_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("x", "unexpected");

        let err = BindError::Fields(errors.clone());
        assert_eq!(err.field_errors(), Some(&errors));
        assert_eq!(err.into_field_errors().unwrap(), errors);

        let err = BindError::BodyConsumed;
        assert!(err.field_errors().is_none());
        assert!(matches!(
            err.into_field_errors(),
            Err(BindError::BodyConsumed)
        ));
    }

    #[test]
    fn test_read_error() {
        let err = BindError::read(BindSource::Form, "invalid boundary");

        assert_eq!(err.error_code(), "READ_FAILED");
        assert_eq!(err.to_string(), "failed to read form values: invalid boundary");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BindError::BodyConsumed.error_code(), "BODY_CONSUMED");
        assert_eq!(
            BindError::PayloadTooLarge {
                limit: 10,
                actual: 20
            }
            .error_code(),
            "PAYLOAD_TOO_LARGE"
        );
        assert_eq!(
            BindError::Fields(FieldErrors::new()).error_code(),
            "INVALID_FIELDS"
        );
    }

    #[test]
    fn test_bind_source_display() {
        assert_eq!(BindSource::Path.to_string(), "path");
        assert_eq!(BindSource::Query.to_string(), "query");
        assert_eq!(BindSource::Form.to_string(), "form");
        assert_eq!(BindSource::Json.to_string(), "json");
        assert_eq!(BindSource::Map.to_string(), "map");
        assert_eq!(BindSource::Merged.to_string(), "merged");
    }
}
