//! Value decoders.
//!
//! Two decoders turn collected request data into a target type:
//!
//! - [`MapDecoder`] decodes a [`ValueMap`](crate::ValueMap) field by field,
//!   with optional weak typing and unknown-key rejection, and reports every
//!   failure at once.
//! - [`decode_strict`] streams a JSON body straight into the target and stops
//!   at the first problem.
//!
//! Both report failures as [`DecodeError`]s. Map decoder failures keep their
//! keys as data; the rendered text escapes them for display only.

use std::fmt;

use thiserror::Error;

use crate::{BindOptions, FieldDescriptor, FieldKind};

mod generic;
mod strict;

pub use generic::MapDecoder;
pub use strict::decode_strict;

/// Constructor used by the binder to build a [`MapDecoder`].
///
/// Swap it with [`Binder::with_decoder_factory`](crate::Binder::with_decoder_factory)
/// to exercise construction failures.
pub type DecoderFactory =
    fn(&'static [FieldDescriptor], BindOptions) -> Result<MapDecoder, ConstructionError>;

/// The decoder could not be set up for the target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Two fields declare the same external key.
    #[error("fields `{first}` and `{second}` both bind key `{key}`")]
    DuplicateKey {
        /// The shared key.
        key: String,
        /// First field declaring it.
        first: String,
        /// Second field declaring it.
        second: String,
    },

    /// Any other setup failure.
    #[error("{0}")]
    Custom(String),
}

/// A single failure recorded by the [`MapDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeFailure {
    /// A value could not be converted to the field's declared type.
    Mismatch {
        /// External key of the field.
        key: String,
        /// Declared type.
        expected: FieldKind,
        /// Type of the value found.
        found: &'static str,
        /// Rendering of the value found.
        value: String,
    },
    /// Keys that matched no field.
    UnexpectedKeys(Vec<String>),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch {
                key,
                expected,
                found,
                value,
            } => write!(
                f,
                "'{key}' expected type '{}', got unconvertible type '{found}', value: '{value}'",
                expected.label()
            ),
            Self::UnexpectedKeys(keys) => {
                let keys: Vec<String> = keys.iter().map(|k| k.escape_debug().to_string()).collect();
                write!(f, "has invalid keys: {}", keys.join(", "))
            }
        }
    }
}

/// A decoder failure.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Every failure found by a [`MapDecoder`] pass.
    #[error("{}", render_failures(.0))]
    Failures(Vec<DecodeFailure>),

    /// The deserializer rejected a value; the path names the field.
    #[error(transparent)]
    Value(#[from] serde_path_to_error::Error<serde_json::Error>),

    /// A JSON body was valid but not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

fn render_failures(failures: &[DecodeFailure]) -> String {
    let mut out = format!("{} error(s) decoding:\n", failures.len());
    for failure in failures {
        out.push_str("\n* ");
        out.push_str(&failure.to_string());
    }
    out
}

/// Names the JSON type of a value for error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(n) if n.is_u64() => "uint",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
